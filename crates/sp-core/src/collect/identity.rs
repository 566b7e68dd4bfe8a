//! Effective uid to account name resolution.

use std::collections::HashMap;
use std::sync::Mutex;

/// Visible characters of an owner name before it is truncated.
pub const OWNER_NAME_WIDTH: usize = 7;

/// Resolves user ids to account names.
pub trait UserResolver: Send + Sync {
    /// Account name for `uid`, or `None` if no account exists.
    fn user_name(&self, uid: u32) -> Option<String>;
}

/// Resolver backed by the system passwd database (`getpwuid_r`).
#[derive(Debug, Default, Clone, Copy)]
pub struct PasswdResolver;

impl UserResolver for PasswdResolver {
    #[cfg(unix)]
    fn user_name(&self, uid: u32) -> Option<String> {
        use std::ffi::CStr;

        // Initial buffer size - will grow if needed
        let mut buf_size = 1024usize;
        let max_buf_size = 65536usize;

        loop {
            let mut buf: Vec<u8> = vec![0; buf_size];
            let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::passwd = std::ptr::null_mut();

            let ret = unsafe {
                libc::getpwuid_r(
                    uid,
                    &mut pwd,
                    buf.as_mut_ptr() as *mut libc::c_char,
                    buf_size,
                    &mut result,
                )
            };

            if ret == libc::ERANGE && buf_size < max_buf_size {
                buf_size *= 2;
                continue;
            }

            if ret != 0 || result.is_null() || pwd.pw_name.is_null() {
                return None;
            }

            // pw_name points into buf, which is still alive here
            let name = unsafe { CStr::from_ptr(pwd.pw_name) }
                .to_string_lossy()
                .into_owned();
            return (!name.is_empty()).then_some(name);
        }
    }

    #[cfg(not(unix))]
    fn user_name(&self, _uid: u32) -> Option<String> {
        None
    }
}

/// Memoizes another resolver; a snapshot looks up the same few uids many times.
#[derive(Debug, Default)]
pub struct CachedUserResolver<R> {
    inner: R,
    cache: Mutex<HashMap<u32, Option<String>>>,
}

impl<R: UserResolver> CachedUserResolver<R> {
    pub fn new(inner: R) -> Self {
        CachedUserResolver {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl<R: UserResolver> UserResolver for CachedUserResolver<R> {
    fn user_name(&self, uid: u32) -> Option<String> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&uid) {
                return hit.clone();
            }
        }
        let name = self.inner.user_name(uid);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(uid, name.clone());
        }
        name
    }
}

/// Fixed uid table, for tests and for hosts without a passwd database.
#[derive(Debug, Default, Clone)]
pub struct StaticUserResolver {
    users: HashMap<u32, String>,
}

impl StaticUserResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, uid: u32, name: impl Into<String>) -> Self {
        self.users.insert(uid, name.into());
        self
    }
}

impl UserResolver for StaticUserResolver {
    fn user_name(&self, uid: u32) -> Option<String> {
        self.users.get(&uid).cloned()
    }
}

/// Owner name as shown in the UID column: at most [`OWNER_NAME_WIDTH`]
/// characters, with `+` appended when anything was cut.
pub fn owner_label(name: &str) -> String {
    let mut chars = name.chars();
    let mut label: String = chars.by_ref().take(OWNER_NAME_WIDTH).collect();
    if chars.next().is_some() {
        label.push('+');
    }
    label
}
