use syn::{Field, FieldsNamed, Ident, Token, Type, punctuated::Punctuated};

fn has_field_named_in(named: &Punctuated<Field, Token![,]>, name: &Ident) -> bool {
    named
        .iter()
        .any(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
}

/// 确保具名字段结构体包含所需字段
/// - 缺失时追加到最前；已存在时保留原定义与原位置
pub(crate) fn ensure_field(fields_named: &mut FieldsNamed, name: &Ident, ty: &Type) {
    if has_field_named_in(&fields_named.named, name) {
        return;
    }

    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();
    new_named.push(syn::parse_quote! { #name: #ty });
    for f in old_named.into_iter() {
        new_named.push(f);
    }

    fields_named.named = new_named;
}
