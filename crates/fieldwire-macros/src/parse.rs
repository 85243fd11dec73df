//! Parsing of `#[bind(...)]` attributes.
//!
//! Container level: `#[bind(crate = "path")]` overrides the path the
//! generated code uses to reach the runtime types.
//!
//! Field level: `param`, `checker`, `default`, `resolver`, `autowire`, each a
//! string literal and each allowed once per field. Several `#[bind]`
//! attributes on one field are merged.

use proc_macro2::Span;
use syn::{
    punctuated::Punctuated, spanned::Spanned, Attribute, Expr, ExprLit, Lit,
    LitStr, Meta, Path, Token, Type,
};

/// Keyword that binds a field's own type recursively.
pub const RECURSIVE: &str = "Recursive";

/// Resolver name that attaches a JSON decoder.
pub const JSON: &str = "Json";

/// Parsed container attributes.
#[derive(Debug)]
pub struct ContainerAttrs {
    /// Path to the runtime crate.
    pub krate: Path,
}

impl ContainerAttrs {
    /// Reads the container's `#[bind]` attributes.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut krate = None;

        for (key, value) in bind_entries(attrs)? {
            match key.as_str() {
                "crate" => {
                    if krate.is_some() {
                        return Err(syn::Error::new(value.span(), "duplicate attribute: crate"));
                    }
                    krate = Some(value.parse::<Path>()?);
                }
                _ => {
                    return Err(syn::Error::new(
                        value.span(),
                        format!("unknown container attribute: {key}"),
                    ))
                }
            }
        }

        Ok(Self {
            krate: krate.unwrap_or_else(|| syn::parse_quote!(::fieldwire)),
        })
    }
}

/// Parsed field attributes.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Origins, keywords, and lookup name.
    pub param: Option<LitStr>,
    /// Validator names.
    pub checker: Option<LitStr>,
    /// Default value.
    pub default: Option<LitStr>,
    /// Resolver name.
    pub resolver: Option<LitStr>,
    /// Singleton name.
    pub autowire: Option<LitStr>,
}

impl FieldAttrs {
    /// Reads a field's `#[bind]` attributes.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for (key, value) in bind_entries(attrs)? {
            let slot = match key.as_str() {
                "param" => &mut parsed.param,
                "checker" => &mut parsed.checker,
                "default" => &mut parsed.default,
                "resolver" => &mut parsed.resolver,
                "autowire" => &mut parsed.autowire,
                _ => {
                    return Err(syn::Error::new(
                        value.span(),
                        format!("unknown attribute: {key}"),
                    ))
                }
            };
            if slot.is_some() {
                return Err(syn::Error::new(value.span(), format!("duplicate attribute: {key}")));
            }
            *slot = Some(value);
        }

        Ok(parsed)
    }

    /// `param` tokens, trimmed, empty ones skipped.
    pub fn param_tokens(&self) -> Vec<String> {
        self.param
            .as_ref()
            .map(LitStr::value)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// True if the field is bound recursively.
    pub fn is_recursive(&self) -> bool {
        self.param_tokens().iter().any(|token| token == RECURSIVE)
    }

    /// True if the field may receive a shared value: autowired, or drawn
    /// from the context (`Ctx` or `Auto`).
    pub fn is_shared(&self) -> bool {
        self.autowire.is_some()
            || self
                .param_tokens()
                .iter()
                .any(|token| token == "Ctx" || token == "Auto")
    }

    /// True if the field names the built-in JSON resolver.
    pub fn wants_json(&self) -> bool {
        self.resolver
            .as_ref()
            .is_some_and(|resolver| resolver.value().trim() == JSON)
    }
}

/// All `key = "value"` entries of the `#[bind(...)]` attributes.
fn bind_entries(attrs: &[Attribute]) -> syn::Result<Vec<(String, LitStr)>> {
    let mut entries = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("bind")) {
        let meta_list = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;

        for meta in meta_list {
            match meta {
                Meta::NameValue(nv) => {
                    let ident = nv
                        .path
                        .get_ident()
                        .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                        .to_string();

                    let value = match &nv.value {
                        Expr::Lit(ExprLit {
                            lit: Lit::Str(s), ..
                        }) => s.clone(),
                        _ => {
                            return Err(syn::Error::new(
                                nv.value.span(),
                                "expected string literal",
                            ))
                        }
                    };

                    entries.push((ident, value));
                }
                _ => return Err(syn::Error::new(meta.span(), "expected name = \"value\"")),
            }
        }
    }

    Ok(entries)
}

/// True if the type's last path segment is `Option`.
pub fn is_option(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

/// Error for inputs that are not structs with named fields.
pub fn not_a_struct(span: Span) -> syn::Error {
    syn::Error::new(span, "Bindable can only be derived for structs with named fields")
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_field_attrs() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[bind(param = "Header,token", checker = "required")]),
            parse_quote!(#[bind(default = "abc")]),
        ];
        let parsed = FieldAttrs::from_attrs(&attrs).unwrap();

        assert_eq!(parsed.param.unwrap().value(), "Header,token");
        assert_eq!(parsed.checker.unwrap().value(), "required");
        assert_eq!(parsed.default.unwrap().value(), "abc");
        assert!(parsed.resolver.is_none());
        assert!(parsed.autowire.is_none());
    }

    #[test]
    fn test_other_attributes_ignored() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[serde(rename = "x")]), parse_quote!(#[doc = "x"])];
        let parsed = FieldAttrs::from_attrs(&attrs).unwrap();
        assert!(parsed.param.is_none());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[bind(param = "Query")]),
            parse_quote!(#[bind(param = "Form")]),
        ];
        let err = FieldAttrs::from_attrs(&attrs).unwrap_err();
        assert!(err.to_string().contains("duplicate attribute: param"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[bind(source = "Query")])];
        let err = FieldAttrs::from_attrs(&attrs).unwrap_err();
        assert!(err.to_string().contains("unknown attribute: source"));
    }

    #[test]
    fn test_non_string_value_rejected() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[bind(default = 5)])];
        assert!(FieldAttrs::from_attrs(&attrs).is_err());
    }

    #[test]
    fn test_token_predicates() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[bind(param = " Recursive , ", resolver = " Json ")])];
        let parsed = FieldAttrs::from_attrs(&attrs).unwrap();
        assert_eq!(parsed.param_tokens(), ["Recursive"]);
        assert!(parsed.is_recursive());
        assert!(parsed.wants_json());
        assert!(!parsed.is_shared());

        let attrs: Vec<Attribute> = vec![parse_quote!(#[bind(param = "Query,Auto")])];
        assert!(FieldAttrs::from_attrs(&attrs).unwrap().is_shared());

        let attrs: Vec<Attribute> = vec![parse_quote!(#[bind(autowire = "db")])];
        assert!(FieldAttrs::from_attrs(&attrs).unwrap().is_shared());
    }

    #[test]
    fn test_container_crate_path() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[bind(crate = "::fieldwire_core")])];
        let parsed = ContainerAttrs::from_attrs(&attrs).unwrap();
        let expected: Path = parse_quote!(::fieldwire_core);
        assert_eq!(parsed.krate, expected);

        let parsed = ContainerAttrs::from_attrs(&[]).unwrap();
        let expected: Path = parse_quote!(::fieldwire);
        assert_eq!(parsed.krate, expected);
    }

    #[test]
    fn test_is_option() {
        assert!(is_option(&parse_quote!(Option<u32>)));
        assert!(is_option(&parse_quote!(std::option::Option<String>)));
        assert!(!is_option(&parse_quote!(Vec<Option<u32>>)));
        assert!(!is_option(&parse_quote!(&'static str)));
    }
}
