//! Standard widget classes
//!
//! Application models extend these instead of starting from scratch:
//!
//! ```ignore
//! static SAVE_DIALOG: Lazy<ClassRef> = Lazy::new(|| {
//!     EntityClass::builder("SaveDialog")
//!         .extends(&WINDOW)
//!         .member("SAVE", EntityDef::sub("save", &BUTTON))
//!         .member("FILE_NAME", EntityDef::sub("fileName", &TEXT_BOX))
//!         .build()
//! });
//! ```

use once_cell::sync::Lazy;

use crate::entity::{Capability, ClassRef, EntityArgs, EntityClass, EntityDef};

/// Root of an application tree
pub static APPLICATION: Lazy<ClassRef> =
    Lazy::new(|| EntityClass::builder("Application").family(true).build());

pub static WINDOW: Lazy<ClassRef> = Lazy::new(|| EntityClass::builder("Window").build());

/// Base for everything that can be clicked
pub static CLICKABLE_ENTITY: Lazy<ClassRef> = Lazy::new(|| {
    EntityClass::builder("ClickableEntity")
        .capability(Capability::Clickable)
        .status_cascade(true)
        .build()
});

pub static BUTTON: Lazy<ClassRef> =
    Lazy::new(|| EntityClass::builder("Button").extends(&CLICKABLE_ENTITY).build());

pub static RADIO: Lazy<ClassRef> =
    Lazy::new(|| EntityClass::builder("Radio").extends(&CLICKABLE_ENTITY).build());

pub static CHECK_BOX: Lazy<ClassRef> =
    Lazy::new(|| EntityClass::builder("CheckBox").extends(&CLICKABLE_ENTITY).build());

pub static DROP_DOWN: Lazy<ClassRef> =
    Lazy::new(|| EntityClass::builder("DropDown").extends(&CLICKABLE_ENTITY).build());

pub static TEXT_BOX: Lazy<ClassRef> = Lazy::new(|| {
    EntityClass::builder("TextBox")
        .capability(Capability::TextInput)
        .status_cascade(true)
        .build()
});

pub static LABEL: Lazy<ClassRef> = Lazy::new(|| {
    EntityClass::builder("Label")
        .capability(Capability::TextOutput)
        .status_cascade(true)
        .build()
});

pub static PROGRESS_BAR: Lazy<ClassRef> = Lazy::new(|| {
    EntityClass::builder("ProgressBar")
        .capability(Capability::Progress)
        .build()
});

/// Scroll bar with `UP`, `DOWN` and `DRAG_BAR` members
pub static SCROLL_BAR: Lazy<ClassRef> = Lazy::new(|| {
    EntityClass::builder("ScrollBar")
        .capability(Capability::Scroll)
        .family(true)
        .member("UP", EntityDef::sub("up", &BUTTON))
        .member("DOWN", EntityDef::sub("down", &BUTTON))
        .member("DRAG_BAR", EntityDef::sub("dragBar", &WINDOW))
        .build()
});

/// Drawing surface driven through [`crate::canvas::Canvas`].
///
/// The scroll bar is searched inside the canvas; a `parent` operator in its
/// `previous` context widens the search when it sits beside the page.
pub static CANVAS: Lazy<ClassRef> = Lazy::new(|| {
    EntityClass::builder("Canvas")
        .capability(Capability::Canvas)
        .status_cascade(true)
        .member("SCROLL_BAR", EntityDef::class(&SCROLL_BAR))
        .member(
            "EXTEND_PAGE",
            EntityDef::sub("extendPage", &BUTTON).with_args(
                EntityArgs::default()
                    .invalidate_on_click(true)
                    .status_cascade(false),
            ),
        )
        .build()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_inherit_click_capability() {
        for class in [&*BUTTON, &*RADIO, &*CHECK_BOX, &*DROP_DOWN] {
            assert_eq!(class.capability(), Capability::Clickable);
            assert!(class.status_cascade());
            assert_eq!(class.base(), "ClickableEntity");
        }
    }

    #[test]
    fn test_scroll_bar_members() {
        assert!(SCROLL_BAR.family());
        assert_eq!(SCROLL_BAR.def("DRAG_BAR").and_then(|d| d.lookup()), Some("dragBar"));
        assert_eq!(SCROLL_BAR.members().len(), 3);
    }

    #[test]
    fn test_canvas_members() {
        assert_eq!(CANVAS.capability(), Capability::Canvas);
        assert_eq!(CANVAS.def("SCROLL_BAR").map(|d| d.key()), Some("ScrollBar"));
        let extend = CANVAS.def("EXTEND_PAGE").unwrap();
        assert!(extend.args().invalidate_on_click);
        assert_eq!(extend.args().status_cascade, Some(false));
    }
}
