use tweetline_core::prelude::*;

pub mod models {
    use serde::{Deserialize, Serialize};
    use tweetline_core::prelude::MergeIncludes;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct UserV2 {
        pub id: String,
        pub name: String,
        pub username: String,
    }

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    pub struct TweetV2 {
        pub id: String,
        pub text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub author_id: Option<String>,
    }

    /// `includes` block of a v2 timeline page.
    #[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
    pub struct ApiV2Includes {
        #[serde(default)]
        pub users: Vec<UserV2>,
        #[serde(default)]
        pub tweets: Vec<TweetV2>,
    }

    impl MergeIncludes for ApiV2Includes {
        fn merge(&mut self, other: Self) {
            self.users.extend(other.users);
            self.tweets.extend(other.tweets);
        }
    }
}

pub type FollowersPaginator<'a, T> =
    TimelinePaginator<'a, T, models::UserV2, PageMeta, models::ApiV2Includes>;

/// Walks a user's followers until `count` accounts were gathered or the list ends.
pub async fn collect_followers<T: Transport>(
    client: &ApiClient<T>,
    user_id: &str,
    count: usize,
) -> Result<Vec<models::UserV2>, ApiClientError> {
    let mut followers: FollowersPaginator<'_, T> = TimelinePaginator::fetch_first(
        client,
        PaginatorEndpoint::user_followers(user_id),
        [("user.fields".to_string(), "username".to_string())],
    )
    .await?;
    if followers.items().len() < count {
        followers.fetch_last(count - followers.items().len()).await?;
    }
    Ok(followers.into_buffer().into_parts().0)
}

pub mod prelude {
    pub use crate::models::{ApiV2Includes, TweetV2, UserV2};
    pub use crate::{FollowersPaginator, collect_followers};
}
