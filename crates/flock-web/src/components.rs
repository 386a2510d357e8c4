//! UI Components

use std::cell::Cell;

use flock_billing::{Notice, NoticeLevel, Notifier};
use leptos::prelude::*;

/// A notice on screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub notice: Notice,
}

/// [`Notifier`] that pushes onto the page's toast list
#[derive(Debug)]
pub struct ToastNotifier {
    toasts: RwSignal<Vec<Toast>>,
    next_id: Cell<u64>,
}

impl ToastNotifier {
    pub fn new(toasts: RwSignal<Vec<Toast>>) -> Self {
        Self { toasts, next_id: Cell::new(0) }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, message = %notice.message, "Toast");
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.toasts.update(|toasts| toasts.push(Toast { id, notice }));
    }
}

const fn level_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Success => "toast toast-success",
        NoticeLevel::Info => "toast toast-info",
        NoticeLevel::Warning => "toast toast-warning",
        NoticeLevel::Error => "toast toast-error",
        NoticeLevel::Critical => "toast toast-critical",
    }
}

/// Dismissable toast stack
#[component]
pub fn ToastList(toasts: RwSignal<Vec<Toast>>) -> impl IntoView {
    view! {
        <div class="toasts">
            <For
                each=move || toasts.get()
                key=|toast| toast.id
                children=move |toast| {
                    let id = toast.id;
                    view! {
                        <div class=level_class(toast.notice.level)>
                            <span>{toast.notice.message}</span>
                            <button
                                class="toast-close"
                                on:click=move |_| toasts.update(|t| t.retain(|toast| toast.id != id))
                            >
                                "×"
                            </button>
                        </div>
                    }
                }
            />
        </div>
    }
}

/// Pay button that shows a spinner label while its purchase is in flight
#[component]
pub fn PayButton(
    #[prop(into)] label: String,
    busy: ReadSignal<bool>,
    on_pay: impl Fn() + 'static,
    #[prop(optional)] primary: bool,
) -> impl IntoView {
    let class = if primary { "btn btn-primary" } else { "btn" };
    view! {
        <button class=class disabled=move || busy.get() on:click=move |_| on_pay()>
            {move || if busy.get() { "Processing...".to_string() } else { label.clone() }}
        </button>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_toast_stands_apart() {
        assert_eq!(level_class(NoticeLevel::Critical), "toast toast-critical");
        assert_ne!(level_class(NoticeLevel::Critical), level_class(NoticeLevel::Error));
    }
}
