use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(FormModel, attributes(form))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let eduform = eduform_path();
    let mut lens_defs = Vec::new();
    let mut fields_methods = Vec::new();
    let mut keys = Vec::new();
    let mut value_arms = Vec::new();
    let mut apply_arms = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let key_name = match field_key_name(&field_ident, &field.attrs) {
            Ok(name) => name,
            Err(error) => return error.to_compile_error().into(),
        };
        let field_ty = field.ty;
        let lens_ident = format_ident!(
            "{model_ident}{}Lens",
            to_pascal_case(&field_ident.to_string())
        );

        keys.push(quote! { #eduform::form::FieldKey::new(#key_name) });

        value_arms.push(quote! {
            #key_name => Some(<#field_ty as #eduform::form::FieldType>::to_field_value(&self.#field_ident)),
        });

        apply_arms.push(quote! {
            #key_name => {
                self.#field_ident = <#field_ty as #eduform::form::FieldType>::from_field_value(value)
                    .ok_or(#eduform::form::ApplyError::TypeMismatch {
                        expected: <#field_ty as #eduform::form::FieldType>::KIND,
                    })?;
                Ok(())
            }
        });

        lens_defs.push(quote! {
            #[derive(Clone, Copy, Debug, Default)]
            pub struct #lens_ident;

            impl #eduform::form::FieldLens<#model_ident> for #lens_ident {
                type Value = #field_ty;

                fn key(self) -> #eduform::form::FieldKey {
                    #eduform::form::FieldKey::new(#key_name)
                }

                fn get<'a>(self, model: &'a #model_ident) -> &'a Self::Value {
                    &model.#field_ident
                }

                fn set(self, model: &mut #model_ident, value: Self::Value) {
                    model.#field_ident = value;
                }
            }
        });

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> #lens_ident {
                #lens_ident
            }
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #eduform::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_keys(&self) -> ::std::vec::Vec<#eduform::form::FieldKey> {
                ::std::vec![#(#keys),*]
            }

            fn value(&self, key: &str) -> ::std::option::Option<#eduform::form::FieldValue> {
                match key {
                    #(#value_arms)*
                    _ => None,
                }
            }

            fn apply(
                &mut self,
                key: &str,
                value: #eduform::form::FieldValue,
            ) -> ::std::result::Result<(), #eduform::form::ApplyError> {
                match key {
                    #(#apply_arms)*
                    _ => Err(#eduform::form::ApplyError::UnknownField),
                }
            }
        }

        #(#lens_defs)*
    }
    .into()
}

fn field_key_name(field_ident: &Ident, attrs: &[syn::Attribute]) -> syn::Result<String> {
    let mut key_name = field_ident.to_string();
    for attr in attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                key_name = value.value();
                Ok(())
            } else {
                Err(meta.error("unsupported form attribute, expected `rename`"))
            }
        })?;
    }
    Ok(key_name)
}

// The library declares `extern crate self as eduform`, so `::eduform` also
// resolves inside the crate itself.
fn eduform_path() -> TokenStream2 {
    match crate_name("eduform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) | Err(_) => quote!(::eduform),
    }
}

fn to_pascal_case(input: &str) -> String {
    let mut out = String::new();
    for segment in input.split('_') {
        if segment.is_empty() {
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
