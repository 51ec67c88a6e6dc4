//! Shared constants for end-to-end tests
//!
//! When seeded accounts or catalog rows change, update only this file.

// ============================================================================
// Test Accounts
// ============================================================================

/// Seeded account username
pub const TEST_USER: &str = "testuser";

/// Seeded account password
pub const TEST_PASS: &str = "testpass123";

/// A second seeded account, for session isolation tests
pub const OTHER_USER: &str = "otheruser";

/// Password of the second seeded account
pub const OTHER_PASS: &str = "otherpass123";

/// Body of every failed login
pub const AUTH_FAILURE_MESSAGE: &str = "Incorrect username or password.";

// ============================================================================
// Seeded Catalog
// ============================================================================

pub const ARTIST_NAME: &str = "Queen";
pub const ARTIST_ID: i64 = 1;

pub const ALBUM_TITLE: &str = "A Night at the Opera";
pub const ALBUM_ID: i64 = 1;

pub const SONG_TITLE: &str = "Bohemian Rhapsody";
pub const SONG_ID: i64 = 1;

/// An id no seeded row uses
pub const MISSING_ID: i64 = 999;

// ============================================================================
// Timeouts
// ============================================================================

/// How long to wait for the server to accept requests
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Per-request timeout of the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Delay between readiness probes
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
