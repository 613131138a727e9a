use proc_macro::TokenStream;

mod event_source;
mod field_utils;

/// 事件源宏
/// - 若缺失则追加字段：`handlers: ::custom_events::HandlerTable`，并置于字段最前
/// - 自动为目标结构体实现 `::custom_events::EventSource`（`handlers`）
/// - 支持参数：`#[event_source(field = name)]`，自定义监听器表字段名，默认 `handlers`
#[proc_macro_attribute]
pub fn event_source(attr: TokenStream, item: TokenStream) -> TokenStream {
    event_source::expand(attr, item)
}
