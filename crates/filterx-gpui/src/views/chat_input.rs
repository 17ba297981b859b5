use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::button::{Button, ButtonVariants};
use gpui_component::input::{Input, InputState};
use gpui_component::{ActiveTheme, Disableable};

use super::chat_view::ChatView;

/// Input row: attach button, text field and send button
#[derive(IntoElement)]
pub struct ChatInput {
    view: Entity<ChatView>,
    input: Entity<InputState>,
    loading: bool,
    can_attach: bool,
}

impl ChatInput {
    pub fn new(view: Entity<ChatView>, input: Entity<InputState>, loading: bool, can_attach: bool) -> Self {
        Self {
            view,
            input,
            loading,
            can_attach,
        }
    }
}

impl RenderOnce for ChatInput {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let view_for_attach = self.view.clone();
        let view_for_send = self.view.clone();

        div()
            .border_1()
            .px_3()
            .py_3()
            .rounded_2xl()
            .border_color(cx.theme().border)
            .bg(cx.theme().secondary)
            .child(
                div()
                    .flex()
                    .flex_row()
                    .child(Input::new(&self.input).appearance(false)),
            )
            .child(
                div()
                    .flex()
                    .flex_row()
                    .items_center()
                    .gap_2()
                    .child(
                        Button::new("attach")
                            .label("+")
                            .tooltip("Upload an image or PDF")
                            .disabled(!self.can_attach)
                            .on_click(move |_, _window, cx| {
                                view_for_attach.update(cx, |view, cx| view.open_file_picker(cx));
                            }),
                    )
                    .child(
                        div()
                            .flex_grow()
                            .text_xs()
                            .text_color(cx.theme().muted_foreground)
                            .when(self.loading, |d| d.child("Waiting for reply..."))
                            .when(!self.loading, |d| d.child("Powered by Gemini")),
                    )
                    .child(
                        Button::new("send")
                            .primary()
                            .label("Send")
                            .disabled(self.loading)
                            .on_click(move |_, window, cx| {
                                view_for_send.update(cx, |view, cx| view.submit(window, cx));
                            }),
                    ),
            )
    }
}
