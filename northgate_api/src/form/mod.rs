//! WebForms postback primitives: hidden state tokens and form bodies.

mod hidden_state;
mod postback;
mod search;

pub use self::hidden_state::HiddenFormState;
pub use self::postback::DocumentPostback;
pub use self::search::{SearchForm, DATE_FORMAT, SEARCH_WINDOW_DAYS};
