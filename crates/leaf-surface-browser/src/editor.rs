//! Editor page wiring.
//!
//! Builds the page's single editing surface (or its plain fallback), then
//! connects the toolbar, overlay controls, upload input and form to the
//! session. Shared state lives in `Rc<RefCell<_>>`. Engine callbacks that
//! arrive while the session is already borrowed are the session's own
//! commands echoing back and are skipped; the session handles those results
//! itself.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use js_sys::Reflect;
use leaf_surface_core::mount::SurfaceRole;
use leaf_surface_core::{
    CapabilityMode, EditingSession, InsertionPoint, MountController, MountOutcome, OverlayReport,
    PlainSession, SurfaceConfig, SurfaceError, Transaction, UploadBridge, initial_content,
    parse_heading_control, place_upload,
};
use wasm_bindgen::prelude::*;
use web_sys::{Element, EventTarget, HtmlElement, HtmlInputElement};

use crate::anchors::DomAnchor;
use crate::capability::load_engine;
use crate::dom::{borrow_when_free, document, is_image, query, query_all};
use crate::fallback::{HiddenField, PlainDomSurface};
use crate::overlay::{DomBounds, OverlayElements};
use crate::tiptap::{TiptapFactory, TiptapSurface};
use crate::upload::{FetchTransport, document_cookies, read_file};

pub type RichSession = EditingSession<TiptapSurface, HiddenField, DomBounds>;
pub type PlainDomSession = PlainSession<PlainDomSurface, HiddenField>;

pub const SURFACE_SELECTOR: &str = "[data-editor-surface]";
pub const FORM_SELECTOR: &str = "[data-editor-form]";
pub const FIELD_SELECTOR: &str = "#id_content_json";
pub const CANVAS_SELECTOR: &str = "[data-editor-canvas]";
pub const HEADING_SELECTOR: &str = "[data-heading]";
pub const COLOR_INPUT_SELECTOR: &str = "[data-color-input]";
pub const IMAGE_BUTTON_SELECTOR: &str = "[data-image-button]";
pub const IMAGE_INPUT_SELECTOR: &str = "[data-image-input]";
pub const IMAGE_REMOVE_SELECTOR: &str = "[data-image-remove]";
pub const UPLOAD_URL_ATTR: &str = "data-upload-url";

/// The editor page's elements.
struct EditorPage {
    surface: HtmlElement,
    form: Element,
    field: HiddenField,
    canvas: Option<Element>,
    image_button: Option<HtmlElement>,
    image_input: Option<HtmlInputElement>,
    overlay: Rc<OverlayElements>,
    headings: Vec<Element>,
}

impl EditorPage {
    fn find() -> Result<Self, SurfaceError> {
        let document = document()?;
        let surface = query::<HtmlElement>(&document, SURFACE_SELECTOR)
            .ok_or(SurfaceError::MissingElement(SURFACE_SELECTOR))?;
        let form = query::<Element>(&document, FORM_SELECTOR)
            .ok_or(SurfaceError::MissingElement(FORM_SELECTOR))?;
        let input = query::<HtmlInputElement>(&document, FIELD_SELECTOR)
            .ok_or(SurfaceError::MissingElement(FIELD_SELECTOR))?;
        Ok(Self {
            surface,
            form,
            field: HiddenField::new(input),
            canvas: query(&document, CANVAS_SELECTOR),
            image_button: query(&document, IMAGE_BUTTON_SELECTOR),
            image_input: query(&document, IMAGE_INPUT_SELECTOR),
            overlay: Rc::new(OverlayElements {
                remove_control: query(&document, IMAGE_REMOVE_SELECTOR),
                color_input: query(&document, COLOR_INPUT_SELECTOR),
            }),
            headings: query_all(&document, HEADING_SELECTOR),
        })
    }
}

/// Set up the editor page. Returns the mode it runs in.
pub async fn mount_editor(config: &SurfaceConfig) -> Result<CapabilityMode, SurfaceError> {
    let page = EditorPage::find()?;
    let config = config
        .clone()
        .with_upload_url(page.form.get_attribute(UPLOAD_URL_ATTR));
    let bridge = Rc::new(UploadBridge::new(FetchTransport::new(), &config));

    let engine = load_engine(&config).await;
    let mode = CapabilityMode::from_load(&engine);
    let surface = match engine {
        Ok(engine) => rich_surface(&page, engine),
        Err(_) => None,
    };

    match surface {
        Some(surface) => {
            let bounds = DomBounds::new(surface.editor().clone(), page.canvas.clone());
            let session = Rc::new(RefCell::new(EditingSession::new(
                surface,
                page.field.clone(),
                bounds,
                &config,
            )));
            wire_rich(&page, &session);
            wire_upload(&page, session, bridge, config);
            Ok(CapabilityMode::Rich)
        }
        None => {
            if mode.is_rich() {
                tracing::warn!("editor surface failed to mount, using plain text");
            }
            let session = Rc::new(RefCell::new(PlainSession::new(
                PlainDomSurface::new(page.surface.clone()),
                page.field.clone(),
            )));
            wire_plain(&page, &session);
            wire_upload(&page, session, bridge, config);
            Ok(CapabilityMode::Plain)
        }
    }
}

/// Mount the editable surface with the field's current content.
fn rich_surface(
    page: &EditorPage,
    engine: crate::capability::EngineModules,
) -> Option<TiptapSurface> {
    let anchor = DomAnchor::new(page.surface.clone(), "editor");
    let mut controller = MountController::new(
        vec![anchor],
        CapabilityMode::Rich,
        TiptapFactory::new(engine),
    );
    match controller.mount_with(0, initial_content(&page.field), SurfaceRole::Editor) {
        MountOutcome::Mounted => controller.surface(0).cloned(),
        _ => None,
    }
}

/// Run `f` on the session unless it is already borrowed, applying the
/// resulting report.
fn with_session(
    session: &Rc<RefCell<RichSession>>,
    overlay: &OverlayElements,
    f: impl FnOnce(&mut RichSession) -> OverlayReport,
) {
    match session.try_borrow_mut() {
        Ok(mut session) => overlay.apply(&f(&mut session)),
        Err(_) => tracing::trace!("session busy, event handled by its caller"),
    }
}

fn listen(
    target: &EventTarget,
    event: &'static str,
    callback: impl FnMut(&web_sys::Event) + 'static,
) {
    EventListener::new(target, event, callback).forget();
}

fn wire_rich(page: &EditorPage, session: &Rc<RefCell<RichSession>>) {
    let editor = session.borrow().surface().editor().clone();

    // Engine events.
    {
        let session = session.clone();
        let overlay = page.overlay.clone();
        let on_transaction = Closure::<dyn FnMut(JsValue)>::new(move |props: JsValue| {
            let doc_changed = Reflect::get(&props, &"transaction".into())
                .and_then(|tr| Reflect::get(&tr, &"docChanged".into()))
                .map(|v| v.is_truthy())
                .unwrap_or(false);
            with_session(&session, &overlay, |s| {
                s.on_transaction(Transaction::applied(doc_changed))
            });
        });
        editor.on("transaction", on_transaction.as_ref().unchecked_ref());
        on_transaction.forget();
    }
    {
        let session = session.clone();
        let overlay = page.overlay.clone();
        let on_selection = Closure::<dyn FnMut(JsValue)>::new(move |_props: JsValue| {
            with_session(&session, &overlay, |s| s.on_selection_update());
        });
        editor.on("selectionUpdate", on_selection.as_ref().unchecked_ref());
        on_selection.forget();
    }

    // Toolbar.
    for button in &page.headings {
        let session = session.clone();
        let overlay = page.overlay.clone();
        let value = button.get_attribute("data-heading").unwrap_or_default();
        listen(button, "click", move |_| match parse_heading_control(&value) {
            Some(command) => with_session(&session, &overlay, |s| s.run(&command)),
            None => tracing::debug!(%value, "heading control ignored"),
        });
    }

    if let Some(input) = page.overlay.color_input.clone() {
        let session = session.clone();
        let overlay = page.overlay.clone();
        let target = input.clone();
        listen(&target, "input", move |_| {
            let color = input.value();
            with_session(&session, &overlay, |s| s.apply_color_input(&color));
        });
    }

    if let Some(control) = page.overlay.remove_control.clone() {
        let session = session.clone();
        let overlay = page.overlay.clone();
        listen(&control, "click", move |_| {
            with_session(&session, &overlay, |s| s.remove_image());
        });
    }

    // Touch on an image selects just past it.
    {
        let session = session.clone();
        let overlay = page.overlay.clone();
        let view_editor = editor.clone();
        listen(&page.surface, "touchstart", move |event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            if !is_image(&target) {
                return;
            }
            let pos = view_editor.view().position_of(&target);
            with_session(&session, &overlay, |s| s.touch_image(pos));
        });
    }

    // Keep the remove control on its image while anything scrolls or resizes.
    if let Some(window) = web_sys::window() {
        let reposition = {
            let session = session.clone();
            let overlay = page.overlay.clone();
            move |_: &web_sys::Event| {
                if let Ok(session) = session.try_borrow() {
                    overlay.place(session.place_remove_control());
                }
            }
        };
        listen(&window, "resize", reposition.clone());
        EventListener::new_with_options(
            &window,
            "scroll",
            EventListenerOptions {
                phase: EventListenerPhase::Capture,
                passive: true,
            },
            reposition,
        )
        .forget();
    }

    let session = session.clone();
    listen(&page.form, "submit", move |_| match session.try_borrow() {
        Ok(session) => session.submit(),
        Err(_) => tracing::warn!("session busy at submit"),
    });
}

fn wire_plain(page: &EditorPage, session: &Rc<RefCell<PlainDomSession>>) {
    {
        let session = session.clone();
        listen(&page.surface, "input", move |_| {
            if let Ok(session) = session.try_borrow() {
                session.on_input();
            }
        });
    }
    let session = session.clone();
    listen(&page.form, "submit", move |_| {
        if let Ok(session) = session.try_borrow() {
            session.submit();
        }
    });
}

/// Connect the image button and file input to an insertion point.
fn wire_upload<T: InsertionPoint + 'static>(
    page: &EditorPage,
    target: Rc<RefCell<T>>,
    bridge: Rc<UploadBridge<FetchTransport>>,
    config: SurfaceConfig,
) {
    let (Some(button), Some(input)) = (page.image_button.clone(), page.image_input.clone()) else {
        return;
    };
    {
        let input = input.clone();
        listen(&button, "click", move |_| input.click());
    }

    let overlay = page.overlay.clone();
    let config = Rc::new(config);
    let picker = input.clone();
    listen(&input, "change", move |_| {
        let Some(file) = picker.files().and_then(|files| files.get(0)) else {
            return;
        };
        let target = target.clone();
        let bridge = bridge.clone();
        let config = config.clone();
        let overlay = overlay.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = match read_file(&file).await {
                Ok(upload) => bridge.upload(upload, &document_cookies()).await,
                Err(err) => Err(err),
            };
            let report =
                borrow_when_free(&*target, |target| place_upload(target, outcome, &config)).await;
            if let Some(report) = report {
                overlay.apply(&report);
            }
        });
        picker.set_value("");
    });
}
