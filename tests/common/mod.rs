#![allow(dead_code)]

use async_trait::async_trait;
use ming800_scraper::client::{ClientResponse, Transport};
use ming800_scraper::error::{ClientError, Result};
use ming800_scraper::session::{Endpoint, Session, SessionConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const BASE_URL: &str = "http://school.test/";
pub const SESSION_ID: &str = "abc123";

#[derive(Debug, Clone)]
pub enum Route {
    Page(String),
    Status(u16),
    Fail,
}

/// In-memory ming800 server keyed by `path?query`.
pub struct FakeServer {
    routes: Mutex<HashMap<String, Route>>,
    login: Mutex<ClientResponse>,
    delay: Duration,
    requests: Mutex<Vec<String>>,
    cookies: Mutex<Vec<Option<String>>>,
    forms: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl FakeServer {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            login: Mutex::new(login_redirect(
                "http://school.test/standard/mainController.controller",
                &[&format!("JSESSIONID={}; Path=/; HttpOnly", SESSION_ID)],
            )),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            cookies: Mutex::new(Vec::new()),
            forms: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }

    /// Every page answer waits this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn page(&self, key: impl Into<String>, body: impl Into<String>) -> &Self {
        self.route(key, Route::Page(body.into()))
    }

    pub fn route(&self, key: impl Into<String>, route: Route) -> &Self {
        self.routes.lock().unwrap().insert(key.into(), route);
        self
    }

    pub fn set_login(&self, response: ClientResponse) {
        *self.login.lock().unwrap() = response;
    }

    /// GET keys in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn cookies(&self) -> Vec<Option<String>> {
        self.cookies.lock().unwrap().clone()
    }

    pub fn forms(&self) -> Vec<String> {
        self.forms.lock().unwrap().clone()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    async fn answer(&self, url: &Url) -> Result<ClientResponse> {
        let route = self.routes.lock().unwrap().get(&key(url)).cloned();

        match route {
            Some(Route::Page(content)) => {
                tokio::time::sleep(self.delay).await;
                Ok(ClientResponse {
                    status: 200,
                    content,
                    ..Default::default()
                })
            }
            Some(Route::Fail) => Err(ClientError::RequestFailed {
                url: url.to_string(),
                message: "connection reset".to_string(),
            }
            .into()),
            Some(Route::Status(status)) => Ok(ClientResponse {
                status,
                ..Default::default()
            }),
            None => Ok(ClientResponse {
                status: 404,
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn get(&self, url: &Url, cookie: Option<&str>) -> Result<ClientResponse> {
        self.requests.lock().unwrap().push(key(url));
        self.cookies.lock().unwrap().push(cookie.map(str::to_string));

        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let response = self.answer(url).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
        response
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &str,
        _cookie: Option<&str>,
    ) -> Result<ClientResponse> {
        self.forms.lock().unwrap().push(form.to_string());
        if url.path() == Endpoint::Login.path() {
            return Ok(self.login.lock().unwrap().clone());
        }
        self.answer(url).await
    }
}

fn key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

pub fn login_redirect(location: &str, set_cookies: &[&str]) -> ClientResponse {
    ClientResponse {
        status: 302,
        location: Some(location.to_string()),
        set_cookies: set_cookies.iter().map(|c| c.to_string()).collect(),
        content: String::new(),
    }
}

pub fn config() -> SessionConfig {
    SessionConfig {
        server_url: BASE_URL.to_string(),
        organization: "my_company".to_string(),
        user: "Frank".to_string(),
        password: "secret".to_string(),
    }
}

pub fn session(server: &Arc<FakeServer>) -> Session {
    let transport: Arc<dyn Transport> = server.clone();
    Session::with_transport(config(), transport).unwrap()
}

pub async fn logged_in(server: &Arc<FakeServer>) -> Session {
    let mut session = session(server);
    session.login().await.unwrap();
    session
}

pub fn student_list_key(class_id: &str, page: usize) -> String {
    format!(
        "{}?clazzInstance.id={}&pageEntity.pageIndex={}",
        Endpoint::ListStudentsOfClass.path(),
        class_id,
        page
    )
}

pub fn student_key(id: &str) -> String {
    format!("{}?student.id={}", Endpoint::ViewStudent.path(), id)
}

pub fn class_key(id: &str) -> String {
    format!("{}?clazzInstance.id={}", Endpoint::ViewClass.path(), id)
}

/// A student listing page; `total_pages` adds the pager marker.
pub fn student_listing(rows: &[(&str, &str, &str)], total_pages: Option<usize>) -> String {
    let mut html = String::from("<table><tr><th>姓名</th><th>电话</th></tr>");
    for (id, name, phone) in rows {
        html.push_str(&format!(
            r#"<tr><td><a href="/edu/student/basicinfo/viewstudent.action?student.id={}">{}</a></td><td>{}</td></tr>"#,
            id, name, phone
        ));
    }
    html.push_str("</table>");
    if let Some(total) = total_pages {
        html.push_str(&format!("<div>共{}页 第1页</div>", total));
    }
    html
}

pub fn student_page(name: &str, phone: &str) -> String {
    format!(
        r#"<table>
             <tr><th colspan="2">基本信息</th></tr>
             <tr><td>姓名：</td><td>{}</td></tr>
           </table>
           <table>
             <tr><th colspan="2">联系方式</th></tr>
             <tr><td>联系电话：</td><td>{}/本人</td></tr>
           </table>"#,
        name, phone
    )
}

/// The category/class listing page; one table per category.
pub fn class_listing(classes: &[(&str, &str, &str)]) -> String {
    let mut html = String::new();
    for (id, category_id, name) in classes {
        html.push_str(&format!(
            r#"<a href="/edu/base/clazz/viewClazz.action?clazz.id={category_id}">category</a>
               <table>
                 <tr><th>班级</th><th>编号</th><th>人数</th><th>状态</th></tr>
                 <tr>
                   <td><a href="/edu/base/clazzInstance/viewClazzInstance.action?clazzInstance.id={id}&clazz.id={category_id}">{name}</a></td>
                   <td>C-{id}</td><td>10</td><td>可报名</td>
                 </tr>
               </table>"#,
        ));
    }
    html
}

pub fn class_page(name: &str, category: &str, teacher: &str) -> String {
    format!(
        r#"<table>
             <tr><th colspan="4">班级信息</th></tr>
             <tr><td>班级名称</td><td>{name}</td><td>类别</td><td>{category}</td></tr>
             <tr><td>教室</td><td>101</td><td></td><td></td></tr>
           </table>
           <span class="teacher">{teacher}</span>
           <span class="period">周六 09:00-10:30</span>"#,
    )
}
