use convert_case::{Case, Casing};
use darling::ast::Data;
use darling::util::{Flag, Ignored};
use darling::{FromDeriveInput, FromField};
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match TableOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(err) => return err.write_errors().into(),
    };

    let info = collect(opts);

    let expanded_table = expand_table(&info);
    let expanded_columns = expand_columns(&info);

    let expanded = quote! {
        #expanded_table

        #expanded_columns
    };

    proc_macro::TokenStream::from(expanded)
}

fn expand_table(info: &Info) -> TokenStream {
    let ident = &info.ident;
    let name = &info.name;

    quote! {
        impl zdb_query::model::Table for #ident {
            const NAME: &'static str = #name;
        }
    }
}

fn expand_columns(info: &Info) -> TokenStream {
    let ident = &info.ident;
    let table = &info.name;

    let accessors = info.columns.iter().map(|column| {
        let ident = &column.ident;
        let name = &column.name;
        let kind = match column.search {
            true => quote! { zdb_query::model::ColumnKind::Search },
            false => quote! { zdb_query::model::ColumnKind::Relational },
        };

        quote! {
            pub fn #ident() -> zdb_query::model::Column {
                zdb_query::model::Column::new(#table, #name, #kind)
            }
        }
    });

    quote! {
        #[allow(dead_code)]
        impl #ident {
            #(#accessors)*
        }
    }
}

struct Info {
    ident: Ident,
    name: String,
    columns: Vec<Column>,
}

struct Column {
    ident: Ident,
    name: String,
    search: bool,
}

#[derive(FromDeriveInput)]
#[darling(attributes(table), supports(struct_named))]
struct TableOpts {
    ident: Ident,
    data: Data<Ignored, ColumnOpts>,
    /// Table name, defaults to the snake case type name
    name: Option<String>,
}

#[derive(FromField)]
#[darling(attributes(column))]
struct ColumnOpts {
    ident: Option<Ident>,
    /// Column name, defaults to the field name
    rename: Option<String>,
    /// Search-indexed column
    search: Flag,
    skip: Flag,
}

fn collect(opts: TableOpts) -> Info {
    let name = opts
        .name
        .unwrap_or_else(|| opts.ident.to_string().to_case(Case::Snake));

    let fields = opts
        .data
        .take_struct()
        .map(|fields| fields.fields)
        .unwrap_or_default();

    let columns = fields
        .into_iter()
        .filter(|field| !field.skip.is_present())
        .filter_map(|field| {
            let ident = field.ident?;
            let name = field.rename.unwrap_or_else(|| ident.to_string());
            Some(Column {
                ident,
                name,
                search: field.search.is_present(),
            })
        })
        .collect();

    Info {
        ident: opts.ident,
        name,
        columns,
    }
}
