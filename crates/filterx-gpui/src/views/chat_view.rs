use futures::StreamExt;
use futures::channel::mpsc;
use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::button::{Button, ButtonVariants};
use gpui_component::input::{InputEvent, InputState};
use gpui_component::notification::Notification;
use gpui_component::scroll::ScrollableElement;
use gpui_component::skeleton::Skeleton;
use gpui_component::{ActiveTheme, Root, WindowExt as _};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use filterx_core::models::{Notice, NoticeLevel, StoreEvent, Subscription};
use filterx_core::services::{
    AttachmentPipeline, FileCandidate, TextExtractor, Typewriter, backend_from_settings,
};
use filterx_core::{ChatSettings, ConversationController, ConversationStore, Role, SubmitOutcome};

use super::attachment_chip::render_attachment_chip;
use super::chat_input::ChatInput;
use super::message_item::render_message;

/// Newest model reply being revealed
struct Reveal {
    message_id: Uuid,
    typewriter: Typewriter,
}

/// The single chat window
pub struct ChatView {
    settings: ChatSettings,
    store: ConversationStore,
    controller: Arc<ConversationController>,
    pipeline: Arc<AttachmentPipeline>,
    input: Entity<InputState>,
    scroll_handle: ScrollHandle,
    reveal: Option<Reveal>,
    reveal_task: Option<Task<()>>,
    _store_subscription: Subscription,
    _store_events: Task<()>,
}

impl ChatView {
    pub fn new(
        settings: ChatSettings,
        extractor: Arc<dyn TextExtractor>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let store = ConversationStore::new();
        let controller = Arc::new(ConversationController::new(
            store.clone(),
            backend_from_settings(&settings),
        ));
        let pipeline = Arc::new(AttachmentPipeline::new(
            store.clone(),
            extractor,
            settings.upload.clone(),
        ));

        let input = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("Type a message...")
                .auto_grow(2, 15)
        });

        // Plain Enter sends, Shift+Enter inserts a newline
        cx.subscribe_in(&input, window, |this, _input, event: &InputEvent, window, cx| {
            if let InputEvent::PressEnter { secondary: false } = event {
                this.submit(window, cx);
            }
        })
        .detach();

        input.update(cx, |input, cx| input.focus(window, cx));

        // Store listeners may fire off the UI thread; hop through a channel
        let (tx, mut rx) = mpsc::unbounded::<StoreEvent>();
        let store_subscription = store.subscribe(move |event| {
            tx.unbounded_send(event.clone()).ok();
        });
        let store_events = cx.spawn_in(window, async move |this, cx| {
            while let Some(event) = rx.next().await {
                if this
                    .update_in(cx, |view, window, cx| view.handle_store_event(event, window, cx))
                    .is_err()
                {
                    break;
                }
            }
        });

        Self {
            settings,
            store,
            controller,
            pipeline,
            input,
            scroll_handle: ScrollHandle::new(),
            reveal: None,
            reveal_task: None,
            _store_subscription: store_subscription,
            _store_events: store_events,
        }
    }

    fn handle_store_event(&mut self, event: StoreEvent, window: &mut Window, cx: &mut Context<Self>) {
        match event {
            StoreEvent::MessageAppended(message) => {
                if message.role() == Role::Model {
                    self.start_reveal(message.id(), message.content().to_string(), cx);
                }
                self.scroll_to_bottom();
            }
            StoreEvent::Notice(notice) => self.show_notice(notice, window, cx),
            StoreEvent::Cleared => {
                self.reveal = None;
                self.reveal_task = None;
            }
            StoreEvent::LoadingChanged(_)
            | StoreEvent::ErrorChanged(_)
            | StoreEvent::AttachmentChanged(_)
            | StoreEvent::ProcessingChanged(_) => {}
        }
        cx.notify();
    }

    fn show_notice(&mut self, notice: Notice, window: &mut Window, cx: &mut Context<Self>) {
        let notification = match notice.level {
            NoticeLevel::Success => Notification::success(notice.message),
            NoticeLevel::Error => Notification::error(notice.message),
        };
        window.push_notification(notification, cx);
    }

    fn start_reveal(&mut self, message_id: Uuid, text: String, cx: &mut Context<Self>) {
        self.reveal = Some(Reveal {
            message_id,
            typewriter: Typewriter::new(text, self.settings.typewriter.chars_per_tick),
        });

        let interval = Duration::from_millis(self.settings.typewriter.tick_interval_ms);
        // replacing the task drops any reveal still running
        self.reveal_task = Some(cx.spawn(async move |this, cx| {
            loop {
                cx.background_executor().timer(interval).await;
                let finished = this
                    .update(cx, |view, cx| view.advance_reveal(cx))
                    .unwrap_or(true);
                if finished {
                    break;
                }
            }
        }));
    }

    /// Returns true once there is nothing left to reveal
    fn advance_reveal(&mut self, cx: &mut Context<Self>) -> bool {
        let finished = match self.reveal.as_mut() {
            Some(reveal) => reveal.typewriter.tick().is_none(),
            None => true,
        };
        if finished {
            self.reveal = None;
        }
        self.scroll_to_bottom();
        cx.notify();
        finished
    }

    pub fn submit(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let text = self.input.read(cx).value().to_string();
        if text.trim().is_empty() || self.store.is_loading() {
            return;
        }

        self.input.update(cx, |input, cx| input.set_value("", window, cx));

        let controller = self.controller.clone();
        cx.spawn_in(window, async move |this, cx| {
            let outcome = controller.submit(&text).await;
            debug!(?outcome, "Submission finished");

            // Nothing was sent; hand the text back unless the user started typing again
            if let SubmitOutcome::Ignored(_) = outcome {
                this.update_in(cx, |view, window, cx| {
                    view.input.update(cx, |input, cx| {
                        if input.value().is_empty() {
                            input.set_value(text, window, cx);
                        }
                    });
                })
                .ok();
            }
        })
        .detach();
    }

    pub fn open_file_picker(&mut self, cx: &mut Context<Self>) {
        if !self.pipeline.is_enabled() {
            return;
        }

        let receiver = cx.prompt_for_paths(PathPromptOptions {
            files: true,
            directories: false,
            multiple: false,
            prompt: Some("Upload an image or PDF".into()),
        });

        cx.spawn(async move |this, cx| {
            if let Ok(Ok(Some(paths))) = receiver.await {
                this.update(cx, |view, cx| view.attach_paths(paths, cx)).ok();
            }
        })
        .detach();
    }

    fn attach_paths(&mut self, paths: Vec<PathBuf>, cx: &mut Context<Self>) {
        let candidates: Result<Vec<_>, _> = paths
            .iter()
            .map(PathBuf::as_path)
            .map(FileCandidate::from_path)
            .collect();

        let candidates = match candidates {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Failed to read dropped file metadata");
                self.store.notify(Notice::error("Failed to upload file"));
                return;
            }
        };

        let pipeline = self.pipeline.clone();
        cx.spawn(async move |_this, _cx| {
            // the pipeline reports the outcome through a notice
            pipeline.ingest(candidates).await.ok();
        })
        .detach();
    }

    fn new_chat(&mut self, cx: &mut Context<Self>) {
        self.store.clear();
        cx.notify();
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_handle.set_offset(point(px(0.0), px(-f32::MAX)));
    }

    fn render_header(&self, cx: &mut Context<Self>) -> impl IntoElement {
        div()
            .flex_shrink_0()
            .flex()
            .flex_row()
            .items_center()
            .px_4()
            .py_3()
            .border_b_1()
            .border_color(cx.theme().border)
            .child(
                div()
                    .flex()
                    .flex_col()
                    .flex_grow()
                    .child(div().text_lg().font_weight(FontWeight::SEMIBOLD).child("FilterX"))
                    .child(
                        div()
                            .text_xs()
                            .text_color(cx.theme().muted_foreground)
                            .child("Powered by Gemini"),
                    ),
            )
            .child(
                Button::new("new-chat")
                    .ghost()
                    .label("New chat")
                    .on_click(cx.listener(|this, _, _window, cx| this.new_chat(cx))),
            )
    }

    fn render_welcome(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let hint = |text: &'static str| {
            div()
                .p_3()
                .rounded_lg()
                .border_1()
                .border_color(cx.theme().border)
                .text_sm()
                .text_color(cx.theme().muted_foreground)
                .child(text)
        };

        div()
            .size_full()
            .flex()
            .flex_col()
            .items_center()
            .justify_center()
            .gap_4()
            .child(div().text_2xl().font_weight(FontWeight::SEMIBOLD).child("Welcome to FilterX"))
            .child(
                div()
                    .max_w(px(420.))
                    .text_center()
                    .text_color(cx.theme().muted_foreground)
                    .child("Start a conversation with our AI assistant. Your message content will be automatically filtered for safety."),
            )
            .child(
                div()
                    .flex()
                    .flex_col()
                    .gap_2()
                    .child(hint("Ask about any topic"))
                    .child(hint("Upload images for visual analysis"))
                    .child(hint("Upload PDFs to chat about their content")),
            )
    }

    fn render_loading_skeleton(&self) -> impl IntoElement {
        div()
            .p_4()
            .flex()
            .flex_col()
            .gap_2()
            .child(Skeleton::new().w(px(280.)).h(px(16.)).rounded(px(4.)))
            .child(Skeleton::new().w(px(220.)).h(px(16.)).rounded(px(4.)))
            .child(Skeleton::new().w(px(180.)).h(px(16.)).rounded(px(4.)))
    }

    fn render_upload_hint(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let processing = self.pipeline.is_processing();
        let max_mb = self.pipeline.limits().max_size / (1024 * 1024);

        div()
            .flex()
            .flex_col()
            .items_center()
            .p_3()
            .rounded_lg()
            .border_1()
            .border_color(cx.theme().border)
            .text_sm()
            .text_color(cx.theme().muted_foreground)
            .child(if processing {
                "Processing file...".to_string()
            } else {
                "Upload an image or PDF".to_string()
            })
            .child(
                div()
                    .text_xs()
                    .child(format!("Drag & drop or click + to upload (max {}MB)", max_mb)),
            )
    }
}

impl Render for ChatView {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let snapshot = self.store.snapshot();
        let dialog_layer = Root::render_dialog_layer(window, cx);
        let notification_layer = Root::render_notification_layer(window, cx);
        let view = cx.entity();
        let store_for_remove = self.store.clone();
        let can_attach = self.pipeline.is_enabled();

        div()
            .size_full()
            .flex()
            .flex_col()
            .bg(cx.theme().background)
            .overflow_hidden()
            .when(cfg!(target_os = "macos"), |this| this.pt(px(24.)))
            .on_drop(cx.listener(|this, paths: &ExternalPaths, _window, cx| {
                this.attach_paths(paths.paths().to_vec(), cx);
            }))
            .child(self.render_header(cx))
            .child(
                div()
                    .flex_1()
                    .min_h_0()
                    .relative()
                    .when(snapshot.messages.is_empty() && !snapshot.loading, |d| {
                        d.child(self.render_welcome(cx))
                    })
                    .when(!snapshot.messages.is_empty() || snapshot.loading, |d| {
                        d.child(
                            div()
                                .id("chat-messages")
                                .track_scroll(&self.scroll_handle)
                                .overflow_scroll()
                                .size_full()
                                .child(
                                    div()
                                        .p_4()
                                        .flex()
                                        .flex_col()
                                        .gap_4()
                                        .children(snapshot.messages.iter().map(|message| {
                                            let visible = self
                                                .reveal
                                                .as_ref()
                                                .filter(|r| r.message_id == message.id())
                                                .map(|r| r.typewriter.visible());
                                            render_message(message, visible, cx)
                                        }))
                                        .when(snapshot.loading, |this| {
                                            this.child(self.render_loading_skeleton())
                                        }),
                                ),
                        )
                        .vertical_scrollbar(&self.scroll_handle)
                    }),
            )
            .child(
                div()
                    .flex_shrink_0()
                    .p_4()
                    .flex()
                    .flex_col()
                    .gap_2()
                    .when_some(snapshot.attachment.as_ref(), |d, attachment| {
                        d.child(render_attachment_chip(
                            attachment,
                            move |_event, _window, _cx| store_for_remove.clear_attachment(),
                            cx,
                        ))
                    })
                    .when(snapshot.attachment.is_none(), |d| {
                        d.child(self.render_upload_hint(cx))
                    })
                    .child(ChatInput::new(
                        view,
                        self.input.clone(),
                        snapshot.loading,
                        can_attach,
                    )),
            )
            .children(dialog_layer)
            .children(notification_layer)
    }
}
