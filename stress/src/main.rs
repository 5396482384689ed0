#![allow(missing_docs)]

use clap::Parser;
use color_eyre::eyre::{bail, WrapErr};
use keyset_graph::{AssocGraph, Capability, NodeId};
use rand::{rngs::SmallRng, Rng, SeedableRng};

const TAG_NAMES: [&str; 4] = ["tag0", "tag1", "tag2", "tag3"];

struct Tag<const N: usize>;

impl<const N: usize> Capability for Tag<N> {
    const NAME: &'static str = TAG_NAMES[N];
}

/// Runs random operations against an association graph and checks its invariants.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of nodes to create up front
    #[clap(short = 'n', long, default_value = "256")]
    nodes: usize,
    /// Number of random operations to perform
    #[clap(short = 's', long, default_value = "100000")]
    steps: usize,
    /// Seed of the random number generator
    #[clap(long, default_value = "0")]
    seed: u64,
    /// Number of distinct capabilities used (at most 4)
    #[clap(short = 'c', long, default_value = "3")]
    capabilities: usize,
    /// Verify all invariants every this many steps
    #[clap(long, default_value = "1000")]
    check_every: usize,
}

fn with_tag<R>(tag: usize, f: impl TagVisitor<R>) -> R {
    match tag {
        0 => f.visit::<Tag<0>>(),
        1 => f.visit::<Tag<1>>(),
        2 => f.visit::<Tag<2>>(),
        _ => f.visit::<Tag<3>>(),
    }
}

trait TagVisitor<R> {
    fn visit<T: Capability>(self) -> R;
}

struct Create<'a>(&'a mut AssocGraph);

impl TagVisitor<NodeId> for Create<'_> {
    fn visit<T: Capability>(self) -> NodeId {
        self.0.create_with::<T>()
    }
}

struct QueryCount<'a>(&'a AssocGraph, NodeId);

impl TagVisitor<usize> for QueryCount<'_> {
    fn visit<T: Capability>(self) -> usize {
        self.0.query_count::<T>(self.1)
    }
}

struct ClearOf<'a>(&'a mut AssocGraph, NodeId);

impl TagVisitor<usize> for ClearOf<'_> {
    fn visit<T: Capability>(self) -> usize {
        self.0.clear_associations_of::<T>(self.1)
    }
}

#[derive(Default, Debug)]
struct Stats {
    created: usize,
    destroyed: usize,
    copied: usize,
    associated: usize,
    disassociated: usize,
    cleared: usize,
    queried: usize,
}

fn main() -> color_eyre::Result<()> {
    let args = Args::parse();

    color_eyre::install()?;
    keyset_logger::setup();

    if args.capabilities == 0 || args.capabilities > TAG_NAMES.len() {
        bail!("--capabilities must be between 1 and {}", TAG_NAMES.len());
    }
    if args.check_every == 0 {
        bail!("--check-every must be positive");
    }

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let mut graph = AssocGraph::with_capacity(args.nodes);
    let mut live: Vec<NodeId> = vec![];
    let mut stats = Stats::default();

    let create = |graph: &mut AssocGraph, rng: &mut SmallRng, live: &mut Vec<NodeId>| {
        let tag = rng.gen_range(0..=args.capabilities);
        let node = if tag == args.capabilities {
            graph.create()
        } else {
            with_tag(tag, Create(graph))
        };
        live.push(node);
    };

    for _ in 0..args.nodes {
        create(&mut graph, &mut rng, &mut live);
        stats.created += 1;
    }

    for step in 0..args.steps {
        if live.len() < 2 {
            create(&mut graph, &mut rng, &mut live);
            stats.created += 1;
            continue;
        }
        let a = live[rng.gen_range(0..live.len())];
        let b = live[rng.gen_range(0..live.len())];
        let tag = rng.gen_range(0..args.capabilities);

        match rng.gen_range(0..100) {
            0..=44 => {
                if a != b && graph.associate(a, b) {
                    stats.associated += 1;
                }
            }
            45..=64 => {
                if graph.disassociate(a, b) {
                    stats.disassociated += 1;
                }
            }
            65..=69 => {
                stats.cleared += graph.clear_associations(a);
            }
            70..=74 => {
                stats.cleared += with_tag(tag, ClearOf(&mut graph, a));
            }
            75..=79 => {
                let index = rng.gen_range(0..live.len());
                graph.destroy(live.swap_remove(index));
                stats.destroyed += 1;
            }
            80..=82 => {
                live.push(graph.copy(a));
                stats.copied += 1;
            }
            83..=89 => {
                create(&mut graph, &mut rng, &mut live);
                stats.created += 1;
            }
            _ => {
                let count = with_tag(tag, QueryCount(&graph, a));
                if count > graph.partner_count(a) {
                    bail!("step {step}: typed view of {a:?} is larger than its partner set");
                }
                stats.queried += 1;
            }
        }

        if step % args.check_every == 0 {
            graph
                .check_invariants()
                .wrap_err_with(|| format!("invariant check failed at step {step}"))?;
            log::debug!(
                "step {step}: {} nodes, {} associations",
                graph.live_count(),
                graph.edge_count()
            );
        }
    }

    graph
        .check_invariants()
        .wrap_err("final invariant check failed")?;

    log::info!(
        "{} live nodes, {} associations, {} capabilities after {} steps",
        graph.live_count(),
        graph.edge_count(),
        graph.capability_count(),
        args.steps
    );
    log::info!("{stats:?}");

    Ok(())
}
