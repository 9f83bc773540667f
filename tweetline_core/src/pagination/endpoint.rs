use crate::error::ApiClientError;
use std::borrow::Cow;
use std::fmt;

/// Path template plus the identifier substituted for its `:id` placeholder.
///
/// Every paged endpoint shares the same merge logic; they only differ by this value.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PaginatorEndpoint {
    template: Cow<'static, str>,
    id: String,
}

impl PaginatorEndpoint {
    pub const USER_BLOCKING: &'static str = "users/:id/blocking";
    pub const USER_FOLLOWERS: &'static str = "users/:id/followers";
    pub const USER_FOLLOWING: &'static str = "users/:id/following";
    pub const USER_LIKED_TWEETS: &'static str = "users/:id/liked_tweets";
    pub const TWEET_LIKING_USERS: &'static str = "tweets/:id/liking_users";
    pub const TWEET_RETWEETED_BY: &'static str = "tweets/:id/retweeted_by";

    #[inline]
    pub fn new(template: impl Into<Cow<'static, str>>, id: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            id: id.into(),
        }
    }

    #[inline]
    pub fn user_blocking(user_id: impl Into<String>) -> Self {
        Self::new(Self::USER_BLOCKING, user_id)
    }

    #[inline]
    pub fn user_followers(user_id: impl Into<String>) -> Self {
        Self::new(Self::USER_FOLLOWERS, user_id)
    }

    #[inline]
    pub fn user_following(user_id: impl Into<String>) -> Self {
        Self::new(Self::USER_FOLLOWING, user_id)
    }

    #[inline]
    pub fn user_liked_tweets(user_id: impl Into<String>) -> Self {
        Self::new(Self::USER_LIKED_TWEETS, user_id)
    }

    #[inline]
    pub fn tweet_liking_users(tweet_id: impl Into<String>) -> Self {
        Self::new(Self::TWEET_LIKING_USERS, tweet_id)
    }

    #[inline]
    pub fn tweet_retweeted_by(tweet_id: impl Into<String>) -> Self {
        Self::new(Self::TWEET_RETWEETED_BY, tweet_id)
    }

    #[inline]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Template with its first `:id` replaced by the percent-encoded id.
    ///
    /// Empty, `.` and `..` ids are rejected: URL resolution would treat them as path steps.
    pub fn path(&self) -> Result<String, ApiClientError> {
        if matches!(self.id.as_str(), "" | "." | "..") {
            return Err(ApiClientError::Pagination(
                format!("invalid endpoint id {:?} for {}", self.id, self.template).into(),
            ));
        }
        Ok(self
            .template
            .replacen(":id", &percent_encode_path_segment(&self.id), 1))
    }
}

impl fmt::Display for PaginatorEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id={})", self.template, self.id)
    }
}

fn percent_encode_path_segment(seg: &str) -> String {
    // RFC3986 "unreserved": ALPHA / DIGIT / "-" / "." / "_" / "~"
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(seg.len());
    for &b in seg.as_bytes() {
        if matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}
