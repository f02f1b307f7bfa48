use chrono::DateTime;
use chrono::Utc;

use crate::record::record_model;

/// A post written directly by a user or generated from a set of notes
#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
    pub id: i64,
    pub content: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

record_model!(
    BlogPost,
    row = BlogPostRow,
    changeset = BlogPostChangeset,
    table = blog_post
);

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use database::DbConnectionPoolV2;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::prelude::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn blog_post_list_is_ordered_by_id() {
        let db_pool = DbConnectionPoolV2::for_tests();
        for content in ["first", "second"] {
            BlogPost::changeset()
                .content(content.to_owned())
                .created_at(Utc::now())
                .create(&mut db_pool.get_ok())
                .await
                .expect("Failed to create blog post");
        }

        let posts = BlogPost::list(&mut db_pool.get_ok())
            .await
            .expect("Failed to list blog posts");

        let contents = posts.iter().map(|p| p.content.as_str()).collect::<Vec<_>>();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn created_within_includes_both_bounds() {
        let db_pool = DbConnectionPoolV2::for_tests();
        let day = |d| Utc.with_ymd_and_hms(2024, 5, d, 12, 0, 0).unwrap();
        for (content, created) in [
            ("late", day(4)),
            ("early", day(2)),
            ("before", day(1)),
            ("last", day(3)),
        ] {
            BlogPost::changeset()
                .content(content.to_owned())
                .created_at(created)
                .create(&mut db_pool.get_ok())
                .await
                .expect("Failed to create blog post");
        }

        let posts = BlogPost::list_created_within(&mut db_pool.get_ok(), day(2), day(4))
            .await
            .expect("Failed to select blog posts");

        let contents = posts.iter().map(|p| p.content.as_str()).collect::<Vec<_>>();
        assert_eq!(contents, vec!["early", "last", "late"]);

        let reversed = BlogPost::list_created_within(&mut db_pool.get_ok(), day(4), day(2))
            .await
            .expect("Failed to select blog posts");
        assert!(reversed.is_empty());
    }
}
