use proc_macro::TokenStream;
use quote::quote;
use syn::parse::ParseStream;
use syn::{Data, DeriveInput, Expr, Fields, Ident, LitStr, Token, Type, parse_macro_input};

/// Derive `DataDefinitionType` and `DataType` for a struct with named fields.
///
/// Every field is a data field unless marked `skip`. The key defaults to the
/// camelCase form of the field name.
///
/// ```ignore
/// #[derive(Default, DataDefinition)]
/// #[data_definition(after_read = clamp_health)]
/// struct Creature {
///     #[data_field(required, priority = 10)]
///     id: String,
///     max_hp: u32,                                  // key "maxHp"
///     #[data_field("tags", inheritance = "always")]
///     tag_list: Vec<String>,
///     #[data_field(constants = MobFlags)]
///     flags: u32,
///     #[data_field(serializer = HexColor)]
///     tint: Color,
///     #[data_field(skip)]
///     cached: usize,
/// }
/// ```
#[proc_macro_derive(DataDefinition, attributes(data_field, data_definition))]
pub fn derive_data_definition(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_data_definition(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `DataEnum` and `DataType` for an enum of unit variants, read and
/// written by variant name.
#[proc_macro_derive(DataEnum)]
pub fn derive_data_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_data_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

// ---------------------------------------------------------------------------
// DataDefinition
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FieldArgs {
    key: Option<LitStr>,
    required: bool,
    priority: Option<Expr>,
    inheritance: Option<LitStr>,
    serializer: Option<Type>,
    constants: Option<Type>,
    skip: bool,
}

impl FieldArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = FieldArgs::default();
        while !input.is_empty() {
            if input.peek(LitStr) {
                args.key = Some(input.parse()?);
            } else {
                let name: Ident = input.parse()?;
                match name.to_string().as_str() {
                    "key" => {
                        input.parse::<Token![=]>()?;
                        args.key = Some(input.parse()?);
                    }
                    "required" => args.required = true,
                    "skip" => args.skip = true,
                    "priority" => {
                        input.parse::<Token![=]>()?;
                        args.priority = Some(input.parse()?);
                    }
                    "inheritance" => {
                        input.parse::<Token![=]>()?;
                        args.inheritance = Some(input.parse()?);
                    }
                    "serializer" => {
                        input.parse::<Token![=]>()?;
                        args.serializer = Some(input.parse()?);
                    }
                    "constants" => {
                        input.parse::<Token![=]>()?;
                        args.constants = Some(input.parse()?);
                    }
                    other => {
                        return Err(syn::Error::new_spanned(
                            &name,
                            format!("unknown data_field argument `{other}`"),
                        ));
                    }
                }
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }
        if args.serializer.is_some() && args.constants.is_some() {
            return Err(input.error("data_field cannot use both `serializer` and `constants`"));
        }
        Ok(args)
    }
}

fn expand_data_definition(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "DataDefinition can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "DataDefinition can only be derived for structs",
            ));
        }
    };

    let mut after_read = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("data_definition")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("after_read") {
                let method: Ident = meta.value()?.parse()?;
                after_read = Some(quote! { .after_read(Self::#method) });
                Ok(())
            } else {
                Err(meta.error("unknown data_definition argument"))
            }
        })?;
    }

    let mut calls = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let mut args = FieldArgs::default();
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("data_field")) {
            args = attr.parse_args_with(FieldArgs::parse)?;
        }
        if args.skip {
            continue;
        }

        let ty = &field.ty;
        let key = match &args.key {
            Some(lit) => lit.value(),
            None => camel_case(&ident.to_string()),
        };
        let accessors = quote! { #key, |s| &s.#ident, |s| &mut s.#ident };

        let mut call = match (&args.serializer, &args.constants) {
            (Some(serializer), _) => quote! { .custom_field::<#ty, #serializer>(#accessors) },
            (_, Some(constants)) => quote! { .constants_field::<#ty, #constants>(#accessors) },
            _ => quote! { .field::<#ty>(#accessors) },
        };
        if args.required {
            call.extend(quote! { .required() });
        }
        if let Some(priority) = &args.priority {
            call.extend(quote! { .priority(#priority) });
        }
        if let Some(lit) = &args.inheritance {
            let behavior = match lit.value().as_str() {
                "default" => quote! { Default },
                "always" => quote! { Always },
                "never" => quote! { Never },
                _ => {
                    return Err(syn::Error::new_spanned(
                        lit,
                        "inheritance must be \"default\", \"always\" or \"never\"",
                    ));
                }
            };
            call.extend(quote! { .inheritance(redlilium_serialization::InheritanceBehavior::#behavior) });
        }
        calls.push(call);
    }

    Ok(quote! {
        impl #impl_generics redlilium_serialization::DataDefinitionType for #name #ty_generics #where_clause {
            fn build_definition() -> redlilium_serialization::DataDefinition<Self> {
                redlilium_serialization::DataDefinition::<Self>::builder()
                    #(#calls)*
                    #after_read
                    .build()
            }
        }

        impl #impl_generics redlilium_serialization::DataType for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #name_str
            }

            fn read(
                node: &redlilium_serialization::DataNode,
                manager: &redlilium_serialization::SerializationManager,
                ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::Result<Self> {
                manager.read_definition::<Self>(node, ctx)
            }

            fn read_into(
                &mut self,
                node: &redlilium_serialization::DataNode,
                manager: &redlilium_serialization::SerializationManager,
                ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::Result<()> {
                manager.read_definition_into(self, node, ctx)
            }

            fn write(
                &self,
                manager: &redlilium_serialization::SerializationManager,
                ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::Result<redlilium_serialization::DataNode> {
                manager.write_definition(self, ctx)
            }

            fn create_copy(
                &self,
                manager: &redlilium_serialization::SerializationManager,
                ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::Result<Self> {
                manager.create_definition_copy(self, ctx)
            }

            fn copy_to(
                &self,
                target: &mut Self,
                manager: &redlilium_serialization::SerializationManager,
                ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::Result<()> {
                manager.copy_definition_to(self, target, ctx)
            }

            fn validate(
                node: &redlilium_serialization::DataNode,
                manager: &redlilium_serialization::SerializationManager,
                ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::ValidationNode {
                manager.validate_definition::<Self>(node, ctx)
            }
        }
    })
}

/// `max_hp` → `maxHp`; a raw identifier prefix is dropped.
fn camel_case(name: &str) -> String {
    let name = name.strip_prefix("r#").unwrap_or(name);
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// DataEnum
// ---------------------------------------------------------------------------

fn expand_data_enum(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "DataEnum can only be derived for enums",
        ));
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "DataEnum variants cannot carry data",
            ));
        }
        variants.push(&variant.ident);
    }
    let names = variants.iter().map(|v| v.to_string());
    let indices = 0..variants.len();
    let from_arms = variants.iter().zip(indices.clone()).map(|(v, i)| {
        quote! { #i => ::core::option::Option::Some(Self::#v) }
    });
    let index_arms = variants.iter().zip(indices).map(|(v, i)| {
        quote! { Self::#v => #i }
    });

    Ok(quote! {
        impl #impl_generics redlilium_serialization::DataEnum for #name #ty_generics #where_clause {
            const VARIANTS: &'static [&'static str] = &[#(#names),*];

            fn from_variant_index(index: usize) -> ::core::option::Option<Self> {
                match index {
                    #(#from_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            fn variant_index(&self) -> usize {
                match *self {
                    #(#index_arms,)*
                }
            }
        }

        impl #impl_generics redlilium_serialization::DataType for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #name_str
            }

            fn read(
                node: &redlilium_serialization::DataNode,
                _manager: &redlilium_serialization::SerializationManager,
                _ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::Result<Self> {
                redlilium_serialization::serializer::enums::read_enum::<Self>(node, #name_str)
            }

            fn write(
                &self,
                _manager: &redlilium_serialization::SerializationManager,
                _ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::Result<redlilium_serialization::DataNode> {
                ::core::result::Result::Ok(redlilium_serialization::serializer::enums::write_enum(self))
            }

            fn create_copy(
                &self,
                _manager: &redlilium_serialization::SerializationManager,
                _ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::Result<Self> {
                redlilium_serialization::serializer::enums::copy_enum(self, #name_str)
            }

            fn validate(
                node: &redlilium_serialization::DataNode,
                _manager: &redlilium_serialization::SerializationManager,
                _ctx: &redlilium_serialization::SerializationContext<'_>,
            ) -> redlilium_serialization::ValidationNode {
                redlilium_serialization::serializer::enums::validate_enum::<Self>(node, #name_str)
            }
        }
    })
}
