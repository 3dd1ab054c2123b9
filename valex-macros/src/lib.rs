use proc_macro2::TokenStream;
use proc_macro_error::{abort, emit_error, proc_macro_error};
use quote::{quote, ToTokens};
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, Data, Fields, Ident, Index, LitStr, Member, Token,
};

/// The tag key of `val` attributes.
const VAL_KEY: &str = "val";

/// The tag key of `field` attributes.
const FIELD_KEY: &str = "field";

#[proc_macro_error]
#[proc_macro_derive(Record, attributes(val, field, tag))]
pub fn derive_record(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);

    match &input.data {
        Data::Struct(_) => Record::new(input).derive().into(),
        Data::Enum(e) => {
            abort!(e.enum_token, "enums are not supported by Record");
        }
        Data::Union(u) => {
            abort!(u.union_token, "unions are not supported by Record");
        }
    }
}

/// The options of a single field, collected from all of its attributes.
#[derive(Default)]
struct FieldOptions {
    /// `(namespace key, tag value)` in declaration order.
    tags: Vec<(String, LitStr)>,
    nested: Option<Ident>,
}

impl FieldOptions {
    fn from_attrs(attrs: &[syn::Attribute]) -> Self {
        let mut options = FieldOptions::default();

        for a in attrs {
            if a.path.is_ident(VAL_KEY) || a.path.is_ident(FIELD_KEY) {
                let key = if a.path.is_ident(VAL_KEY) {
                    VAL_KEY
                } else {
                    FIELD_KEY
                };

                match a.parse_args::<LitStr>() {
                    Ok(s) => options.tags.push((key.to_string(), s)),
                    Err(err) => abort!(err.span(), r#"expected a tag string, as in #[{}("...")]"#, key),
                }
            } else if a.path.is_ident("tag") {
                match a.parse_args::<TagOptions>() {
                    Ok(tag) => options.merge(tag),
                    Err(err) => abort!(err.span(), "{}", err),
                }
            }
        }

        options
    }

    fn merge(&mut self, other: TagOptions) {
        if let Some(v) = other.nested {
            if let Some(existing_v) = &self.nested {
                emit_error!(existing_v, "{} defined here", existing_v);
                abort!(v, r#"duplicate keys "{}""#, v);
            }

            self.nested = v.into();
        }

        self.tags.extend(other.tags);
    }

    fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.nested.is_none()
    }
}

/// The contents of `#[tag(...)]`.
///
/// A tag value belongs to the last `ns = "..."` before it:
///
/// ```ignore
/// #[tag(ns = "admin", "nonzeroint", "maxint,max=10", nested)]
/// ```
#[derive(Default)]
struct TagOptions {
    tags: Vec<(String, LitStr)>,
    nested: Option<Ident>,
}

impl Parse for TagOptions {
    fn parse(content: ParseStream) -> syn::Result<Self> {
        let mut opts = TagOptions::default();
        let mut ns: Option<LitStr> = None;

        loop {
            if content.is_empty() {
                break;
            }

            if content.peek(LitStr) {
                let value = content.parse::<LitStr>()?;
                match &ns {
                    Some(ns) => opts.tags.push((ns.value(), value)),
                    None => abort!(value, r#"tag value without a namespace, add ns = "..." before it"#),
                }
            } else {
                let id = content.parse::<Ident>()?;

                if id == "ns" {
                    content.parse::<Token![=]>()?;
                    let key = content.parse::<LitStr>()?;
                    if key.value().trim().is_empty() {
                        abort!(key, "namespace key cannot be empty");
                    }
                    ns = Some(key);
                } else if id == "nested" {
                    if let Some(existing_v) = &opts.nested {
                        emit_error!(existing_v, "{} defined here", existing_v);
                        abort!(id, r#"duplicate keys "{}""#, id);
                    }
                    opts.nested = Some(id);
                } else {
                    abort!(id, r#"unknown tag option "{}""#, id);
                }
            }

            if content.peek(Token![,]) {
                content.parse::<Token![,]>()?;
            }
        }

        Ok(opts)
    }
}

struct Record {
    input: syn::DeriveInput,
}

impl Record {
    fn new(input: syn::DeriveInput) -> Self {
        Self { input }
    }

    /// `(name, member, options)` of every field with at least one option.
    fn fields(&self) -> Vec<(String, Member, FieldOptions)> {
        let fields = match &self.input.data {
            Data::Struct(s) => &s.fields,
            _ => unreachable!(),
        };

        let named = matches!(fields, Fields::Named(_));

        fields
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                let options = FieldOptions::from_attrs(&f.attrs);
                if options.is_empty() {
                    return None;
                }

                let (name, member) = match (&f.ident, named) {
                    (Some(ident), true) => (ident.to_string(), Member::Named(ident.clone())),
                    _ => (i.to_string(), Member::Unnamed(Index::from(i))),
                };

                Some((name, member, options))
            })
            .collect()
    }

    fn derive(self) -> TokenStream {
        let fields = self.fields();

        let walk = fields.iter().map(|(name, member, options)| {
            Self::field_stmts(name, options, quote!(&self.#member))
        });

        let walk_mut = fields.iter().map(|(name, member, options)| {
            Self::field_stmts(name, options, quote!(&mut self.#member))
        });

        let ident = &self.input.ident;
        let (impl_gen, ty_gen, where_gen) = self.input.generics.split_for_impl();

        quote! {
            impl #impl_gen ::valex::Record for #ident #ty_gen #where_gen {
                fn walk(
                    &self,
                    __visitor: &mut dyn ::valex::field::Visitor,
                ) -> ::core::result::Result<(), ::valex::Error> {
                    #(#walk)*
                    ::core::result::Result::Ok(())
                }

                fn walk_mut(
                    &mut self,
                    __visitor: &mut dyn ::valex::field::VisitorMut,
                ) -> ::core::result::Result<(), ::valex::Error> {
                    #(#walk_mut)*
                    ::core::result::Result::Ok(())
                }
            }
        }
    }

    /// The field's own tags first, then the nested record.
    fn field_stmts(name: &str, options: &FieldOptions, access: TokenStream) -> TokenStream {
        let mut stmts = TokenStream::new();

        if !options.tags.is_empty() {
            let keys = options.tags.iter().map(|(k, _)| k);
            let values = options.tags.iter().map(|(_, v)| v);

            quote! {
                {
                    const __TAGS: &[(&str, &str)] = &[#((#keys, #values)),*];
                    __visitor.visit_field(&::valex::FieldInfo::new(#name, __TAGS), #access)?;
                }
            }
            .to_tokens(&mut stmts);
        }

        if options.nested.is_some() {
            quote! {
                __visitor.visit_record(#name, #access)?;
            }
            .to_tokens(&mut stmts);
        }

        stmts
    }
}
