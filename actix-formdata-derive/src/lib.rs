use parse_size::parse_size;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ext::IdentExt, parse_macro_input, Data, DeriveInput, Field, Fields, FieldsNamed, Lit, LitStr};

/// Derive `actix_formdata::form::FormData` for a struct with named fields.
///
/// Every `#[form(key = "value")]` entry records a tag under `key`; the decoder
/// reads the tag under its configured key (`formdata` by default) to find the
/// wire name. `"-"` excludes the field. `max_size = 5MiB` limits uploads.
#[proc_macro_derive(FormData, attributes(form))]
pub fn form_data(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    match expand(&ast) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct FieldAttrs {
    tags: Vec<(String, String)>,
    max_size: Option<usize>,
}

fn expand(ast: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &ast.ident;

    let fields = if let Data::Struct(syn::DataStruct {
        fields: Fields::Named(FieldsNamed { ref named, .. }),
        ..
    }) = ast.data
    {
        named
    } else {
        return Err(syn::Error::new_spanned(
            name,
            "FormData can only be derived on a struct with named fields",
        ));
    };

    let mut schema = Vec::with_capacity(fields.len());
    let mut slots = Vec::with_capacity(fields.len());

    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let declared = ident.unraw().to_string();
        let FieldAttrs { tags, max_size } = field_attrs(field)?;

        let tags = tags.iter().map(|(key, value)| quote! { (#key, #value) });
        let max_size = match max_size {
            Some(size) => quote! { ::std::option::Option::Some(#size) },
            None => quote! { ::std::option::Option::None },
        };

        schema.push(quote! {
            ::actix_formdata::form::FieldSchema {
                name: #declared,
                tags: &[#(#tags),*],
                max_size: #max_size,
            }
        });

        slots.push(quote! {
            (&&&&::actix_formdata::field::Probe::new(&mut self.#ident)).resolve()
        });
    }

    let field_len = schema.len();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::actix_formdata::form::FormData for #name #ty_generics #where_clause {
            fn schema() -> &'static [::actix_formdata::form::FieldSchema] {
                // Field metadata ordered by field.
                static SCHEMA: [::actix_formdata::form::FieldSchema; #field_len] = [#(#schema,)*];
                &SCHEMA
            }

            fn fields(&mut self) -> ::std::vec::Vec<::actix_formdata::field::FieldSlot<'_>> {
                #[allow(unused_imports)]
                use ::actix_formdata::field::{
                    ResolveBuiltin as _, ResolveCustom as _, ResolveOptionalCustom as _,
                    ResolveUnsupported as _,
                };

                ::std::vec![#(#slots,)*]
            }
        }
    })
}

fn field_attrs(field: &Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs {
        tags: Vec::new(),
        max_size: None,
    };

    for attr in &field.attrs {
        // Check for form attribute.
        if !attr.path().is_ident("form") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .ok_or_else(|| meta.error("expected a tag key"))?
                .unraw()
                .to_string();

            if key == "max_size" {
                let lit: Lit = meta.value()?.parse()?;
                let lit_string = match &lit {
                    Lit::Int(l) => l.to_string(),
                    Lit::Float(f) => f.to_string(),
                    Lit::Str(s) => s.value(),
                    _ => return Err(syn::Error::new(lit.span(), "must be a number with size suffix")),
                };

                let max_size = parse_size(lit_string).map_err(|_| syn::Error::new(lit.span(), "invalid size"))?;
                let max_size = usize::try_from(max_size)
                    .map_err(|_| syn::Error::new(lit.span(), "size does not fit in usize"))?;
                attrs.max_size = Some(max_size);
                return Ok(());
            }

            let value: LitStr = meta.value()?.parse()?;
            if attrs.tags.iter().any(|(existing, _)| *existing == key) {
                return Err(meta.error(format!("duplicate `{key}` tag")));
            }
            attrs.tags.push((key, value.value()));
            Ok(())
        })?;
    }

    Ok(attrs)
}
