//! Verification engine: token issuance on registration, token redemption
//! on submission. Orchestrates the identity store, token ledger, roster
//! cache, and email dispatch.

use std::sync::Arc;

use crate::email::EmailSender;
use crate::error::BotError;
use crate::roster::{RosterCache, RosterRow};
use crate::store::{TokenLedger, User, UserStore};

/// Subject line of the verification email
const EMAIL_SUBJECT: &str = "Potvrdi svoj email";

/// Result of a successful redemption: everything the caller needs to apply
/// the follow-up platform mutations.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub user: User,
    pub row: RosterRow,
}

pub struct VerificationEngine<S, E> {
    store: S,
    email: E,
    roster: Arc<RosterCache>,
    community_name: String,
}

impl<S, E> VerificationEngine<S, E>
where
    S: UserStore + TokenLedger,
    E: EmailSender,
{
    pub fn new(store: S, email: E, roster: Arc<RosterCache>, community_name: String) -> Self {
        Self {
            store,
            email,
            roster,
            community_name,
        }
    }

    /// Registration: look the email up in the roster, get-or-create the
    /// user, issue a token, and email it.
    ///
    /// Token issuance and email dispatch are sequential, not transactional:
    /// a dispatch failure surfaces after the token already exists. That is
    /// intentional; re-registering simply issues another valid token.
    pub async fn register(&self, external_id: &str, email: &str) -> Result<(), BotError> {
        let Some(row) = self.roster.find_by_email(email).await else {
            tracing::info!(user = external_id, "Registration with unknown email");
            return Err(BotError::EmailNotInRoster);
        };

        let user = self
            .store
            .get_or_create_user(external_id, row.national_key.trim())?;

        tracing::info!(user = external_id, "Creating verification attempt");
        let token = self.store.issue_token(user.id)?;

        self.email
            .send_email(email, EMAIL_SUBJECT, &verification_email_body(&token, &self.community_name))
            .map_err(BotError::External)?;

        Ok(())
    }

    /// Redemption: resolve the user, their roster row, and consume the
    /// token. The caller normalizes the token (lowercase, trimmed) before
    /// calling. All token-mismatch reasons collapse into `InvalidToken`.
    pub async fn redeem(&self, external_id: &str, token: &str) -> Result<Redemption, BotError> {
        let Some(user) = self.store.get_user_by_external_id(external_id)? else {
            tracing::warn!(user = external_id, "Redemption attempt by unregistered user");
            return Err(BotError::NotRegistered);
        };

        let Some(row) = self.roster.find_by_national_key(&user.national_key).await else {
            // Integrity gap: the identity store knows this user but the
            // roster does not.
            tracing::error!(user = external_id, "Registered user not found in roster");
            return Err(BotError::NotInRoster);
        };

        let Some(attempt) = self.store.redeem_token(user.id, token)? else {
            return Err(BotError::InvalidToken);
        };

        tracing::info!(user = external_id, attempt = attempt.id.0, "Token redeemed");

        Ok(Redemption { user, row })
    }
}

/// Fixed human-readable template for the token email
fn verification_email_body(token: &str, community_name: &str) -> String {
    let rule = "=".repeat(token.len());

    format!(
        "Bok!\n\
         \n\
         Dobivaš ovaj mail jer je netko zatražio verifikaciju tvog emaila na {community_name} serveru.\n\
         \n\
         Tvoj token je:\n\
         {rule}\n\
         {token}\n\
         {rule}\n\
         \n\
         Da ga potvrdiš, iskoristi /predaj-kod naredbu na istom serveru na kojem je zatražen.\n\
         U slučaju da zahtjev nije došao od tebe, slobodno ignoriraš ovaj email.\n\
         \n\
         Lijep pozdrav,\n  {community_name} bot"
    )
}
