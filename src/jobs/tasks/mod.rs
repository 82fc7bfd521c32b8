mod order_emails;
mod token_cleanup;

pub use order_emails::OrderEmailsTask;
pub use token_cleanup::TokenCleanupTask;
