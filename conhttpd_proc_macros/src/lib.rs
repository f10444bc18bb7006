use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Generates `FIELD_NAMES`, the declaration-ordered list of the struct's field names.
///
/// Form value structs use it as their editable field list, so the set of fields
/// a form parses and the set of fields it renders can never drift apart.
#[proc_macro_derive(FieldNames)]
pub fn field_names(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let struct_name = input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = if let syn::Data::Struct(syn::DataStruct {
                                              fields: syn::Fields::Named(ref fields),
                                              ..
                                          }) = input.data {
        fields
    } else {
        return syn::Error::new_spanned(struct_name, "Only named struct fields are supported")
            .to_compile_error()
            .into();
    };

    let names = fields.named.iter().filter_map(|field| {
        let field_name = field.ident.as_ref()?;
        Some(quote! { stringify!(#field_name) })
    });

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            pub const FIELD_NAMES: &'static [&'static str] = &[#(#names),*];
        }
    };

    TokenStream::from(expanded)
}
