mod session;

pub use session::SessionIssuer;
