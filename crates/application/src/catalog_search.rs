use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use turnstile_domain::{
    AccessPoint, CatalogQuery, DEFAULT_SEARCH_QUIESCENCE, FieldAccessor, Permission,
    PermissionGroup, Role, SearchSession,
};

/// Fields matched by permission searches.
pub const PERMISSION_SEARCH_FIELDS: &[FieldAccessor<Permission>] =
    &[Permission::code, Permission::description];

/// Fields matched by access point searches.
pub const ACCESS_POINT_SEARCH_FIELDS: &[FieldAccessor<AccessPoint>] = &[
    AccessPoint::endpoint_path,
    AccessPoint::module,
    access_point_method,
];

/// Fields matched by permission group searches.
pub const GROUP_SEARCH_FIELDS: &[FieldAccessor<PermissionGroup>] = &[group_name];

/// Fields matched by role searches.
pub const ROLE_SEARCH_FIELDS: &[FieldAccessor<Role>] = &[Role::name];

fn access_point_method(access_point: &AccessPoint) -> &str {
    access_point.http_method().as_str()
}

fn group_name(group: &PermissionGroup) -> &str {
    group.name().as_str()
}

/// Drives a catalog listing from a stream of search inputs.
///
/// Inputs are coalesced through a quiescence window so a burst of keystrokes
/// or a scripted import issues one query for the settled term.
#[derive(Debug, Clone)]
pub struct CatalogSearchSession {
    session: SearchSession,
}

impl CatalogSearchSession {
    /// Creates a driver with the default quiet period.
    #[must_use]
    pub fn new(query: CatalogQuery) -> Self {
        Self::with_window(query, DEFAULT_SEARCH_QUIESCENCE)
    }

    /// Creates a driver with a custom quiet period.
    #[must_use]
    pub fn with_window(query: CatalogQuery, window: Duration) -> Self {
        Self {
            session: SearchSession::new(query, window),
        }
    }

    /// Returns the query currently in effect.
    #[must_use]
    pub fn query(&self) -> &CatalogQuery {
        self.session.query()
    }

    /// Consumes inputs until the channel closes, running `run_query` once per
    /// settled term change.
    ///
    /// A pending input is flushed after its window when the channel closes.
    /// Returns the final query.
    pub async fn run<F, Fut>(
        mut self,
        mut inputs: mpsc::Receiver<String>,
        mut run_query: F,
    ) -> CatalogQuery
    where
        F: FnMut(CatalogQuery) -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            let deadline = self.session.deadline().map(Instant::from_std);
            let wake_at = deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                received = inputs.recv() => match received {
                    Some(search) => self.session.input(search, Instant::now().into_std()),
                    None => {
                        if let Some(deadline) = deadline {
                            tokio::time::sleep_until(deadline).await;
                            self.settle(&mut run_query).await;
                        }
                        return self.session.query().clone();
                    }
                },
                () = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                    self.settle(&mut run_query).await;
                }
            }
        }
    }

    async fn settle<F, Fut>(&mut self, run_query: &mut F)
    where
        F: FnMut(CatalogQuery) -> Fut,
        Fut: Future<Output = ()>,
    {
        if let Some(query) = self.session.poll(Instant::now().into_std()) {
            debug!(search = query.search(), "running settled catalog search");
            run_query(query).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use turnstile_domain::{AccessPoint, AccessPointId, CatalogQuery, HttpMethod, search_items};

    use super::{ACCESS_POINT_SEARCH_FIELDS, CatalogSearchSession};

    #[tokio::test(start_paused = true)]
    async fn burst_of_inputs_runs_one_query() {
        let (sender, receiver) = mpsc::channel(8);
        for term in ["u", "us", "use", "user"] {
            sender
                .send(term.to_owned())
                .await
                .unwrap_or_else(|error| panic!("{error}"));
        }
        drop(sender);

        let mut issued = Vec::new();
        let final_query = CatalogSearchSession::new(CatalogQuery::new(None, Some(3), None))
            .run(receiver, |query| {
                issued.push((query.search().to_owned(), query.page()));
                std::future::ready(())
            })
            .await;

        assert_eq!(issued, vec![("user".to_owned(), 1)]);
        assert_eq!(final_query.search(), "user");
    }

    #[tokio::test(start_paused = true)]
    async fn inputs_separated_by_quiet_period_each_run() {
        let (sender, receiver) = mpsc::channel(8);
        let producer = tokio::spawn(async move {
            for term in ["leave", "leave approve"] {
                sender
                    .send(term.to_owned())
                    .await
                    .unwrap_or_else(|error| panic!("{error}"));
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        });

        let mut issued = Vec::new();
        CatalogSearchSession::with_window(CatalogQuery::default(), Duration::from_millis(300))
            .run(receiver, |query| {
                issued.push(query.search().to_owned());
                std::future::ready(())
            })
            .await;
        producer.await.unwrap_or_else(|error| panic!("{error}"));

        assert_eq!(issued, vec!["leave".to_owned(), "leave approve".to_owned()]);
    }

    #[test]
    fn access_point_search_matches_http_method() {
        let users = AccessPoint::new(
            AccessPointId::new(),
            "/api/users",
            HttpMethod::Get,
            "users",
            false,
        )
        .unwrap_or_else(|error| panic!("{error}"));
        let leave = AccessPoint::new(
            AccessPointId::new(),
            "/api/leave",
            HttpMethod::Post,
            "leave",
            false,
        )
        .unwrap_or_else(|error| panic!("{error}"));

        let matched = search_items(vec![users.clone(), leave], "get", ACCESS_POINT_SEARCH_FIELDS);
        assert_eq!(matched, vec![users]);
    }
}
