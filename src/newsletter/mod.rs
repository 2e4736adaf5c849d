mod dispatcher;

pub use dispatcher::{DispatchReport, send_campaign};
