use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::{require_transparent_newtype, resolve_crate, Newtype};

pub fn derive_id(input: DeriveInput) -> syn::Result<TokenStream> {
    #![allow(non_snake_case)]

    let DeriveInput {
        attrs,
        ident,
        generics,
        data,
        ..
    } = input;

    let Newtype {
        field,
        field_ty: inner,
    } = require_transparent_newtype(&ident, "Id", &attrs, &data)?;

    // Fully qualified paths so user code shadowing prelude items does not break the expansion
    let keyset_ids = resolve_crate("keyset-ids");
    let usize = quote![::core::primitive::usize];
    let bool = quote![::core::primitive::bool];

    let Id = quote![#keyset_ids::Id];

    let Clone = quote![::core::clone::Clone];
    let Copy = quote![::core::marker::Copy];
    let Eq = quote![::core::cmp::Eq];
    let Hash = quote![::core::hash::Hash];
    let Hasher = quote![::core::hash::Hasher];
    let Option = quote![::core::option::Option];
    let Ord = quote![::core::cmp::Ord];
    let PartialEq = quote![::core::cmp::PartialEq];
    let PartialOrd = quote![::core::cmp::PartialOrd];
    let Ordering = quote![::core::cmp::Ordering];

    let target_ident = ident;
    let (impl_generics, type_generics, where_clause) = generics.split_for_impl();
    let target_type = quote![#target_ident #type_generics];

    Ok(quote! {
        impl #impl_generics #Id for #target_type #where_clause {
            const MAX_ID_INDEX: #usize = <#inner as #Id>::MAX_ID_INDEX;
            const MIN_ID: Self = Self { #field: <#inner as #Id>::MIN_ID };
            const MAX_ID: Self = Self { #field: <#inner as #Id>::MAX_ID };

            #[inline(always)]
            fn id_index(self) -> #usize {
                <#inner as #Id>::id_index(self.#field)
            }

            #[inline(always)]
            fn try_from_id_index(index: #usize) -> #Option<Self> {
                #Option::Some(Self { #field: <#inner as #Id>::try_from_id_index(index)? })
            }

            #[inline(always)]
            #[track_caller]
            fn from_id_index(index: #usize) -> Self {
                Self { #field: <#inner as #Id>::from_id_index(index) }
            }
        }

        impl #impl_generics #Copy for #target_type #where_clause {}

        impl #impl_generics #Clone for #target_type #where_clause {
            #[inline(always)]
            fn clone(&self) -> Self {
                *self
            }
        }

        impl #impl_generics #PartialEq for #target_type #where_clause {
            #[inline(always)]
            fn eq(&self, other: &Self) -> #bool {
                #PartialEq::eq(&self.#field, &other.#field)
            }
        }

        impl #impl_generics #Eq for #target_type #where_clause {}

        impl #impl_generics #Hash for #target_type #where_clause {
            #[inline(always)]
            fn hash<H: #Hasher>(&self, state: &mut H) {
                #Hash::hash(&self.#field, state)
            }
        }

        impl #impl_generics #PartialOrd for #target_type #where_clause {
            #[inline(always)]
            fn partial_cmp(&self, other: &Self) -> #Option<#Ordering> {
                #Option::Some(#Ord::cmp(self, other))
            }
        }

        impl #impl_generics #Ord for #target_type #where_clause {
            #[inline(always)]
            fn cmp(&self, other: &Self) -> #Ordering {
                #Ord::cmp(&self.#field, &other.#field)
            }
        }
    })
}
