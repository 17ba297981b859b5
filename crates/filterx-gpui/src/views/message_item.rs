use filterx_core::Message;
use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::ActiveTheme;

/// Render one chat bubble.
///
/// `visible` overrides the text while a reply is still being revealed.
pub fn render_message(message: &Message, visible: Option<&str>, cx: &App) -> impl IntoElement {
    let is_user = message.is_user();
    let text = visible.unwrap_or(message.content()).to_string();
    let author = if is_user { "You" } else { "FilterX" };

    div()
        .id(ElementId::Name(message.id().to_string().into()))
        .w_full()
        .flex()
        .flex_row()
        .when(is_user, |d| d.justify_end())
        .when(!is_user, |d| d.justify_start())
        .child(
            div()
                .max_w(relative(0.8))
                .flex()
                .flex_col()
                .gap_1()
                .child(
                    div()
                        .flex()
                        .flex_row()
                        .gap_2()
                        .text_xs()
                        .text_color(cx.theme().muted_foreground)
                        .when(is_user, |d| d.justify_end())
                        .child(author)
                        .child(message.display_time()),
                )
                .child(
                    div()
                        .px_3()
                        .py_2()
                        .rounded_lg()
                        .text_sm()
                        .when(is_user, |d| {
                            d.bg(cx.theme().primary)
                                .text_color(cx.theme().primary_foreground)
                        })
                        .when(!is_user, |d| {
                            d.bg(cx.theme().secondary)
                                .border_1()
                                .border_color(cx.theme().border)
                        })
                        .child(text),
                ),
        )
}
