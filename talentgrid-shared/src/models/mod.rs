/// Database models for TalentGrid
///
/// The registry core (`identity`, `organization`, `membership`) and the
/// satellite records owned by identities and organizations.
///
/// # Models
///
/// - `identity`: Individual user accounts and their role tags
/// - `organization`: Companies and institutes
/// - `membership`: Role and status an identity holds in an organization
/// - `profile`: One profile per identity, enriched from resumes
/// - `job_posting`: Openings published by companies
/// - `application`: Candidate applications to postings
/// - `gig`: Priced services offered by individuals
/// - `conversation`: Conversations and their messages
///
/// # Example
///
/// ```no_run
/// use talentgrid_shared::models::identity::{CreateIdentity, Identity};
/// use talentgrid_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let identity = Identity::create(&pool, CreateIdentity {
///     email: "ada@example.com".to_string(),
///     full_name: Some("Ada Lovelace".to_string()),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod application;
pub mod conversation;
pub mod gig;
pub mod identity;
pub mod job_posting;
pub mod membership;
pub mod organization;
pub mod profile;
