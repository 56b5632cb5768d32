//! Boarding actions: slot layouts per detachment and the exception rules that
//! adjust slot capacity.

pub mod exceptions;
pub mod slots;

pub use exceptions::{ExceptionRule, RuleContext};
pub use slots::{
    is_enhancement_group, BoardingActionsConfig, DetachmentSlots, Slot, SlotOption,
    DETACHMENT_CATEGORY, GENERIC_CATEGORY,
};
