//! Channel Authorizer: a pure function of
//! `(user_id, channel_name)`. No dependencies, no side effects, no shared
//! state, deliberately kept separate from `TokenVerifier` so the policy
//! can change without touching signature verification.

use courier_common::types::ChannelName;

/// Ownership enforcement for `strategy.`, `forge.job.`, and `backtest.`
/// channels is an open policy hook: the source code defers to
/// "assume authorized" pending an external ownership oracle, so this single
/// method is where that oracle would be consulted later.
pub struct ChannelAuthorizer;

impl ChannelAuthorizer {
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` iff `user_id` may subscribe to `channel`.
    pub fn authorize(&self, user_id: &str, channel: &ChannelName) -> bool {
        if channel.is_global() {
            return true;
        }
        if channel.is_user_scoped() {
            return channel.scoped_id() == Some(user_id);
        }
        if channel.is_strategy_scoped() || channel.is_ephemeral() {
            return true;
        }
        false
    }
}

impl Default for ChannelAuthorizer {
    fn default() -> Self {
        Self::new()
    }
}
