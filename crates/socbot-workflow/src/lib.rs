//! Workflows driving the SOC web application through a [`socbot_browser::Driver`].

pub mod dom;
mod error;
pub mod login;
pub mod modal;
pub mod navigator;
pub mod session;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use login::{Credentials, LoginState, authenticate, is_credential_error, login};
pub use modal::{ModalResult, check_and_handle_modal};
pub use navigator::{
    ScreenInfo, change_company, current_screen_info, go_to_main_screen,
    navigate_to_screen_by_number,
};
pub use session::{Session, SessionOptions};
pub use transfer::{CheckboxChange, Phase, PhaseOutcome, transfer};
