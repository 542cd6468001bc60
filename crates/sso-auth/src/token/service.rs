//! Token lifecycle orchestration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use sso_core::config::AuthConfig;
use sso_core::error::AppError;
use sso_core::result::AppResult;
use sso_core::retry::RetryExecutor;
use sso_database::repositories::MemberRepository;
use sso_entity::member::{Member, UpsertMember};
use sso_entity::session::{DeviceInfo, Session};

use crate::jwt::{JwtDecoder, JwtEncoder};
use crate::principal::Principal;
use crate::privilege::PrivilegeResolver;
use crate::session::SessionStore;

/// Tokens handed out at login.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// The session row the tokens are bound to.
    pub session: Session,
}

/// Result of a successful refresh.
#[derive(Debug, Clone)]
pub struct RefreshedAccess {
    /// New access token.
    pub access_token: String,
    /// Its expiry.
    pub expires_at: DateTime<Utc>,
}

/// Issues, verifies, and refreshes tokens.
///
/// Verification is stateless. Issuance and refresh write the session
/// table through [`SessionStore`].
#[derive(Clone)]
pub struct TokenService {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    sessions: SessionStore,
    privileges: PrivilegeResolver,
    members: Arc<dyn MemberRepository>,
    retry: RetryExecutor,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("encoder", &self.encoder)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates the service. Fails when the signing secrets are missing or
    /// equal.
    pub fn new(
        config: &AuthConfig,
        sessions: SessionStore,
        privileges: PrivilegeResolver,
        members: Arc<dyn MemberRepository>,
        retry: RetryExecutor,
    ) -> AppResult<Self> {
        config.validate()?;

        Ok(Self {
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            sessions,
            privileges,
            members,
            retry,
        })
    }

    /// Session store used by this service.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Privilege resolver used by this service.
    pub fn privileges(&self) -> &PrivilegeResolver {
        &self.privileges
    }

    /// Provisions the member described by the identity provider and issues
    /// a token pair for it.
    pub async fn login(
        &self,
        profile: &UpsertMember,
        device: DeviceInfo,
    ) -> AppResult<(Member, IssuedTokens)> {
        let now = Utc::now();
        let member = self
            .retry
            .execute("member.upsert", || {
                self.members.upsert_by_external_id(profile, now)
            })
            .await?;

        let tokens = self.issue(&member, device).await?;
        Ok((member, tokens))
    }

    /// Signs a fresh access/refresh pair and records a new session.
    pub async fn issue(&self, member: &Member, device: DeviceInfo) -> AppResult<IssuedTokens> {
        let now = Utc::now();
        let session_id = Uuid::new_v4();

        let (access_token, access_expires_at) =
            self.encoder.encode_access(member, session_id, now)?;
        let (refresh_token, refresh_expires_at) =
            self.encoder.encode_refresh(member.id, session_id, now)?;

        let session = self
            .sessions
            .create(
                session_id,
                member.id,
                &access_token,
                &refresh_token,
                refresh_expires_at,
                device,
            )
            .await?;

        info!(member_id = member.id, session_id = %session.id, "Tokens issued");

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
            session,
        })
    }

    /// Verifies an access token's signature, expiry, and type.
    pub fn verify(&self, access_token: &str) -> AppResult<Principal> {
        let claims = self.decoder.decode_access(access_token)?;
        Ok(Principal::from_claims(claims, self.privileges.clone()))
    }

    /// Loads the member a principal refers to.
    pub async fn member(&self, member_id: i64) -> AppResult<Member> {
        self.retry
            .execute("member.find_by_id", || self.members.find_by_id(member_id))
            .await?
            .ok_or_else(|| AppError::member_not_found("Member no longer exists"))
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// The refresh token itself stays valid until its session expires or
    /// is revoked. Of two concurrent refreshes on one session exactly one
    /// succeeds; the other fails with `StaleSession`.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshedAccess> {
        let claims = self.decoder.decode_refresh(refresh_token)?;

        let session = self
            .sessions
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| AppError::invalid_refresh_token("Unknown refresh token"))?;

        if session.member_id != claims.sub || session.id != claims.sid {
            warn!(
                session_id = %session.id,
                "Refresh token claims do not match stored session"
            );
            return Err(AppError::invalid_refresh_token("Unknown refresh token"));
        }

        let now = Utc::now();
        if !session.is_live_at(now) {
            return Err(AppError::stale_session("Session has expired"));
        }

        let member = self.member(claims.sub).await?;

        let (access_token, expires_at) = self.encoder.encode_access(&member, session.id, now)?;
        let session_expiry = self.sessions.expiry_from(now, claims.expires_at());

        let rotated = self
            .sessions
            .rotate(session.id, session.generation, &access_token, session_expiry)
            .await?;

        info!(
            member_id = member.id,
            session_id = %rotated.id,
            generation = rotated.generation,
            "Access token refreshed"
        );

        Ok(RefreshedAccess {
            access_token,
            expires_at,
        })
    }

    /// Ends a session. Its refresh token stops working immediately; access
    /// tokens already issued stay valid until they expire.
    pub async fn revoke_session(&self, session_id: Uuid) -> AppResult<()> {
        self.sessions.revoke(session_id).await
    }
}
