use filterx_core::models::Attachment;
use gpui::*;
use gpui_component::ActiveTheme;

/// Chip for the staged attachment; `on_remove` runs when the × is clicked
pub fn render_attachment_chip(
    attachment: &Attachment,
    on_remove: impl Fn(&MouseDownEvent, &mut Window, &mut App) + 'static,
    cx: &App,
) -> impl IntoElement {
    let badge = if attachment.is_image() { "IMG" } else { "PDF" };

    div()
        .flex()
        .flex_row()
        .items_center()
        .gap_2()
        .p_2()
        .rounded_lg()
        .border_1()
        .border_color(cx.theme().border)
        .bg(cx.theme().secondary)
        .child(
            div()
                .w_10()
                .h_10()
                .flex()
                .items_center()
                .justify_center()
                .rounded_md()
                .bg(rgb(0xe5e7eb))
                .text_xs()
                .text_color(rgb(0x6b7280))
                .child(badge),
        )
        .child(
            div()
                .flex()
                .flex_col()
                .flex_grow()
                .min_w_0()
                .child(div().text_sm().truncate().child(attachment.name.clone()))
                .child(
                    div()
                        .text_xs()
                        .text_color(cx.theme().muted_foreground)
                        .child(attachment.describe()),
                ),
        )
        .child(
            div()
                .w_5()
                .h_5()
                .bg(rgb(0x374151))
                .rounded_full()
                .flex()
                .items_center()
                .justify_center()
                .cursor_pointer()
                .text_color(rgb(0xffffff))
                .text_xs()
                .hover(|style| style.bg(rgb(0x111827)))
                .child("×")
                .on_mouse_down(MouseButton::Left, on_remove),
        )
}
