use crate::field_utils::ensure_field;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Ident, Item, Result, Token, Type, parse::Parse, parse::ParseStream};

/// #[event_source] 宏实现
/// - 若缺失则追加监听器表字段（默认名 `handlers`），置于字段最前
/// - 自动实现 `::custom_events::EventSource`
/// - 已存在同名字段时复用原定义，类型需为 `HandlerTable`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand_tokens(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_tokens(attr: TokenStream2, item: TokenStream2) -> Result<TokenStream2> {
    let cfg: EventSourceAttrConfig = syn::parse2(attr)?;
    let input: Item = syn::parse2(item)?;

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return Err(syn::Error::new(other.span(), "#[event_source] only on struct"));
        }
    };

    // 仅支持具名字段结构体
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return Err(syn::Error::new(st.span(), "only supports named-field struct"));
        }
    };

    let field = cfg
        .field
        .unwrap_or_else(|| Ident::new("handlers", proc_macro2::Span::call_site()));
    let table_ty: Type = syn::parse_quote! { ::custom_events::HandlerTable };
    ensure_field(fields_named, &field, &table_ty);

    let ident = &st.ident;
    let generics = st.generics.clone();
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        #st

        impl #impl_generics ::custom_events::EventSource for #ident #ty_generics #where_clause {
            fn handlers(&self) -> &::custom_events::HandlerTable {
                &self.#field
            }
        }
    })
}

// -------- parsing --------

struct EventSourceAttrConfig {
    field: Option<Ident>,
}

impl Parse for EventSourceAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut field: Option<Ident> = None;

        if input.is_empty() {
            return Ok(Self { field });
        }

        let pairs: Punctuated<KvIdent, Token![,]> =
            Punctuated::<KvIdent, Token![,]>::parse_terminated(input)?;

        for kv in pairs.into_iter() {
            let key = kv.key.to_string();
            match key.as_str() {
                "field" => {
                    if field.is_some() {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "duplicate key 'field' in attribute",
                        ));
                    }
                    field = Some(kv.value);
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key in attribute; expected 'field'",
                    ));
                }
            }
        }

        Ok(Self { field })
    }
}

struct KvIdent {
    key: Ident,
    value: Ident,
}

impl Parse for KvIdent {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: Ident = input.parse()?;
        Ok(Self { key, value })
    }
}
