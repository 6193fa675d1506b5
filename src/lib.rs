//! convex-deploy: unattended Convex deployments through a pseudo-terminal
//!
//! `npx convex dev --once` only shows its interactive prompts when attached
//! to a terminal. This crate spawns it on a pty, watches everything it prints,
//! answers the known prompts with canned responses, and afterwards checks
//! that `.env.local` received a hosted deployment URL.
//!
//! The building blocks are generic and usable for other prompt sequences:
//!
//! - [`Session`]: a child process on a pty with non-blocking reads
//! - [`Trigger`] and [`Rule`]: what to look for and what to answer
//! - [`Responder`]: ordered rules with once-only guards
//! - [`Driver`]: the poll loop tying a session to a responder
//! - [`PostCheck`]: marker check on a file produced by the child
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use convex_deploy::{Driver, Responder, Rule, Session, Trigger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let responder = Responder::new(vec![
//!         Rule::new("confirm", Trigger::exact("Continue? (y/n)"), "y\n")?.once(),
//!         Rule::new("name", Trigger::ignore_case("your name"), "ferris\n")?,
//!     ]);
//!
//!     let session = Session::spawn("./setup.sh")?;
//!     let transcript = Driver::new(responder)
//!         .run(session, &mut std::io::stdout(), tokio::signal::ctrl_c())
//!         .await?;
//!
//!     println!("answered {} prompts", transcript.exchanges.len());
//!     Ok(())
//! }
//! ```
//!
//! # Prompt Matching
//!
//! After every successful read the whole accumulated output is tested
//! against the rules in order and the first match wins. Guarded rules
//! ([`Rule::once`]) fire at most once per session; unguarded rules fire on
//! every iteration their trigger is visible.

#![warn(missing_docs)]

mod buffer;
mod driver;
mod pattern;
mod postcheck;
mod responder;
mod result;
mod session;

pub mod convex;

// Public API exports
pub use buffer::{LossyDecoder, OutputBuffer};
pub use driver::Driver;
pub use pattern::{Matcher, Trigger};
pub use postcheck::{Outcome, PostCheck};
pub use responder::{Responder, Rule};
pub use result::{DriverError, Exchange, PatternError, Transcript};
pub use session::{Session, SessionBuilder};

// Re-export commonly used types
pub use portable_pty::ExitStatus;
