use darling::FromDeriveInput;
use darling::FromField;
use darling::FromVariant;
use darling::ast::Data;
use darling::ast::Fields;
use darling::ast::Style;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

#[derive(FromDeriveInput)]
#[darling(attributes(noteblog_error), supports(enum_any))]
struct ErrorOptions {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<ErrorVariant, ()>,
    base_id: String,
    #[darling(default)]
    default_status: Option<u16>,
}

#[derive(FromVariant)]
#[darling(attributes(noteblog_error))]
struct ErrorVariant {
    ident: syn::Ident,
    fields: Fields<ErrorField>,
    #[darling(default)]
    status: Option<u16>,
    #[darling(default)]
    no_context: bool,
}

#[derive(FromField)]
struct ErrorField {
    ident: Option<syn::Ident>,
    ty: syn::Type,
}

struct VariantExpansion {
    status_arm: TokenStream,
    type_arm: TokenStream,
    context_arm: TokenStream,
    definition: TokenStream,
}

/// The name of the type used in the OpenAPI error context, `Vec<String>` gives `Vec`
fn type_name(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        syn::Type::Reference(reference) => type_name(&reference.elem),
        _ => String::from("Object"),
    }
}

fn expand_variant(
    options: &ErrorOptions,
    variant: &ErrorVariant,
) -> darling::Result<VariantExpansion> {
    let ident = &variant.ident;
    let status = variant
        .status
        .or(options.default_status)
        .unwrap_or(500);
    if !(100..=599).contains(&status) {
        return Err(
            darling::Error::custom(format!("invalid HTTP status code {status}")).with_span(ident),
        );
    }
    let error_type = format!("noteblog:{}:{}", options.base_id, ident);
    let pattern = match variant.fields.style {
        Style::Unit => quote! { Self::#ident },
        Style::Tuple => quote! { Self::#ident(..) },
        Style::Struct => quote! { Self::#ident { .. } },
    };

    let context_fields = if variant.fields.style == Style::Struct && !variant.no_context {
        variant
            .fields
            .iter()
            .filter_map(|field| field.ident.as_ref().map(|name| (name, &field.ty)))
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };
    let context_arm = if context_fields.is_empty() {
        quote! { #pattern => ::std::collections::HashMap::new(), }
    } else {
        let names = context_fields.iter().map(|(name, _)| name).collect::<Vec<_>>();
        quote! {
            Self::#ident { #(#names,)* .. } => {
                let mut context = ::std::collections::HashMap::new();
                #(
                    context.insert(
                        stringify!(#names).to_owned(),
                        ::serde_json::to_value(#names).unwrap_or_default(),
                    );
                )*
                context
            }
        }
    };

    let context_types = context_fields
        .iter()
        .map(|(name, ty)| (name.to_string(), serde_json::Value::String(type_name(ty))))
        .collect::<serde_json::Map<_, _>>();
    let context_serialized = serde_json::Value::Object(context_types).to_string();
    let name = ident.to_string();
    let namespace = options.ident.to_string();

    Ok(VariantExpansion {
        status_arm: quote! {
            #pattern => ::axum::http::StatusCode::from_u16(#status)
                .expect("status codes are checked at compile time"),
        },
        type_arm: quote! { #pattern => #error_type, },
        context_arm,
        definition: quote! {
            ::inventory::submit! {
                crate::error::ErrorDefinition::new(#error_type, #name, #namespace, #status, #context_serialized)
            }
        },
    })
}

pub(super) fn expand(input: &DeriveInput) -> darling::Result<TokenStream> {
    let options = ErrorOptions::from_derive_input(input)?;
    if !options.generics.params.is_empty() {
        return Err(
            darling::Error::custom("generic error types are not supported")
                .with_span(&options.generics),
        );
    }
    let Data::Enum(variants) = &options.data else {
        return Err(darling::Error::unsupported_shape("struct").with_span(&options.ident));
    };

    let mut errors = darling::Error::accumulator();
    let expansions = variants
        .iter()
        .filter_map(|variant| errors.handle(expand_variant(&options, variant)))
        .collect::<Vec<_>>();
    errors.finish()?;

    let ident = &options.ident;
    let status_arms = expansions.iter().map(|e| &e.status_arm);
    let type_arms = expansions.iter().map(|e| &e.type_arm);
    let context_arms = expansions.iter().map(|e| &e.context_arm);
    let definitions = expansions.iter().map(|e| &e.definition);

    Ok(quote! {
        impl crate::error::NoteblogError for #ident {
            fn get_status(&self) -> ::axum::http::StatusCode {
                match self {
                    #(#status_arms)*
                }
            }

            fn get_type(&self) -> &str {
                match self {
                    #(#type_arms)*
                }
            }

            fn context(&self) -> ::std::collections::HashMap<String, ::serde_json::Value> {
                match self {
                    #(#context_arms)*
                }
            }
        }

        #(#definitions)*
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn expand_str(input: &str) -> Result<String, String> {
        let input = syn::parse_str::<DeriveInput>(input).expect("test input should parse");
        expand(&input)
            .map(|tokens| tokens.to_string().replace(' ', ""))
            .map_err(|e| e.to_string())
    }

    #[test]
    fn named_fields_make_up_the_context() {
        let expanded = expand_str(
            r#"
            #[noteblog_error(base_id = "note")]
            enum NoteError {
                #[noteblog_error(status = 404)]
                NotFound { note_id: i64 },
                Database(#[from] noteblog_models::Error),
            }
            "#,
        )
        .expect("expansion should succeed");

        assert!(expanded.contains(r#""noteblog:note:NotFound""#));
        assert!(expanded.contains(r#""noteblog:note:Database""#));
        assert!(expanded.contains("from_u16(404u16)"));
        assert!(expanded.contains("from_u16(500u16)"));
        assert!(expanded.contains("stringify!(note_id)"));
        assert!(expanded.contains(r#""{\"note_id\":\"i64\"}""#));
    }

    #[test]
    fn no_context_variants_have_an_empty_context() {
        let expanded = expand_str(
            r#"
            #[noteblog_error(base_id = "thing", default_status = 400)]
            enum ThingError {
                #[noteblog_error(no_context)]
                Broken { secret: String },
            }
            "#,
        )
        .expect("expansion should succeed");

        assert!(!expanded.contains("stringify!(secret)"));
        assert!(expanded.contains("from_u16(400u16)"));
    }

    #[test]
    fn invalid_status_codes_are_rejected() {
        let error = expand_str(
            r#"
            #[noteblog_error(base_id = "thing")]
            enum ThingError {
                #[noteblog_error(status = 42)]
                Weird,
            }
            "#,
        )
        .expect_err("expansion should fail");

        assert!(error.contains("invalid HTTP status code 42"), "{error}");
    }

    #[test]
    fn type_names_keep_the_last_segment() {
        let ty = syn::parse_str::<syn::Type>("std::vec::Vec<crate::FieldError>").unwrap();
        assert_eq!(type_name(&ty), "Vec");
        let ty = syn::parse_str::<syn::Type>("&'static str").unwrap();
        assert_eq!(type_name(&ty), "str");
    }
}
