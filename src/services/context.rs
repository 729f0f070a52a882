//! 调用方身份与分页参数

use serde::Serialize;

use crate::errors::{Result, SopError};
use crate::storage::{RestaurantScope, Role};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
/// 页码上限；保证 (page - 1) * page_size 不会溢出
pub const MAX_PAGE: u64 = 1_000_000;

/// 已认证的调用方
///
/// 只能由会话校验（HTTP）或 CLI 的可信路径构造；
/// 其中的 scope 决定了所有数据访问的租户边界。
#[derive(Debug, Clone)]
pub struct Actor {
    pub staff_id: String,
    pub role: Role,
    pub scope: RestaurantScope,
    pub ip: Option<String>,
}

impl Actor {
    pub fn new(staff_id: impl Into<String>, role: Role, scope: RestaurantScope) -> Self {
        Self {
            staff_id: staff_id.into(),
            role,
            scope,
            ip: None,
        }
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip = ip;
        self
    }

    /// 角色不足时返回 Forbidden
    pub fn require(&self, role: Role) -> Result<()> {
        if self.role.at_least(role) {
            Ok(())
        } else {
            Err(SopError::forbidden(format!(
                "Requires {} role, current role is {}",
                role, self.role
            )))
        }
    }
}

/// `page` 从 1 开始；`page_size` 限制在 1..=100，默认 20
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamps() {
        assert_eq!(
            PageRequest::new(None, None),
            PageRequest {
                page: 1,
                page_size: 20
            }
        );
        assert_eq!(PageRequest::new(Some(0), Some(0)).page, 1);
        assert_eq!(PageRequest::new(Some(3), Some(0)).page_size, 1);
        assert_eq!(PageRequest::new(Some(3), Some(500)).page_size, 100);
        assert_eq!(PageRequest::new(Some(u64::MAX), Some(100)).page, MAX_PAGE);
    }

    #[test]
    fn test_total_pages() {
        let page = Page::new(Vec::<u8>::new(), PageRequest::new(Some(1), Some(20)), 41);
        assert_eq!(page.total_pages(), 3);
        let empty = Page::new(Vec::<u8>::new(), PageRequest::default(), 0);
        assert_eq!(empty.total_pages(), 0);
    }

    #[test]
    fn test_actor_role_check() {
        let actor = Actor::new("s1", Role::Manager, RestaurantScope::new("r1"));
        assert!(actor.require(Role::Staff).is_ok());
        assert!(actor.require(Role::Manager).is_ok());
        assert!(matches!(
            actor.require(Role::Admin),
            Err(SopError::Forbidden(_))
        ));
    }
}
