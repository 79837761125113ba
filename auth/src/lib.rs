//! Wallet sign-in for microcred.
//!
//! A login attempt runs through three pieces:
//! - [`NonceService`] issues a single-use nonce, persisted server-side with
//!   an expiry and named by the `siwe_nonce` cookie.
//! - [`siwe::verify`] checks an EIP-4361 message signed by the wallet
//!   against that nonce and recovers the signer.
//! - [`SessionIssuer`] writes an HMAC-signed `user_info` cookie for the
//!   verified address.

pub mod cookie;
pub mod error;
pub mod nonce;
pub mod session;
pub mod siwe;

pub use cookie::{read_cookie, SetCookie, NONCE_COOKIE, SESSION_COOKIE};
pub use error::{NonceError, SessionError, SiweError};
pub use nonce::{NonceService, DEFAULT_NONCE_TTL_SECS, NONCE_BYTES};
pub use session::{SessionClaims, SessionIssuer, MIN_SECRET_LEN, SESSION_TTL_SECS};
pub use siwe::{SiweMessage, WalletAuthPayload};
