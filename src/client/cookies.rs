use crate::log_debug;
use cookie_store::{CookieStore as Jar, StoreAction};
use tokio::sync::RwLock;
use url::Url;

/// Cookie jar shared by every request of a session.
///
/// Expiry, domain and path rules are applied by `cookie_store`. Reads take a
/// shared lock so concurrent detail fetches never wait on each other; only
/// login and logout write.
#[derive(Debug, Default)]
pub struct CookieStore {
    jar: RwLock<Jar>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the `Set-Cookie` values of a response to `url`. Returns how many
    /// cookies were inserted or updated; expired and malformed ones are not kept.
    pub async fn store(&self, set_cookies: &[String], url: &Url) -> usize {
        let mut jar = self.jar.write().await;
        let mut kept = 0;

        for header in set_cookies {
            match jar.parse(header, url) {
                Ok(StoreAction::Inserted) | Ok(StoreAction::UpdatedExisting) => kept += 1,
                Ok(StoreAction::ExpiredExisting) => {
                    log_debug!("[cookies] Expired by {:?}", header);
                }
                Err(e) => {
                    log_debug!("[cookies] Ignoring {:?}: {}", header, e);
                }
            }
        }

        kept
    }

    /// Value of the named cookie as it would be sent to `url`.
    pub async fn get(&self, url: &Url, name: &str) -> Option<String> {
        self.jar
            .read()
            .await
            .get_request_values(url)
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.to_string())
    }

    /// Value for the `Cookie` header of a request to `url`, `None` when no
    /// cookie applies.
    pub async fn header(&self, url: &Url) -> Option<String> {
        let jar = self.jar.read().await;
        let pairs: Vec<String> = jar
            .get_request_values(url)
            .map(|(n, v)| format!("{}={}", n, v))
            .collect();

        (!pairs.is_empty()).then(|| pairs.join("; "))
    }

    pub async fn clear(&self) {
        self.jar.write().await.clear();
    }
}
