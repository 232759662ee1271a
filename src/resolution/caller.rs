//! # Caller Context
//!
//! Resolution requests arrive from host code that does not say which tenant
//! it acts for. Callers recover that identity in one of two ways:
//!
//! - an explicit tenant token, entered with [`enter_tenant_scope`], which
//!   always wins when present;
//! - the current thread's chain of code-unit frames, maintained with
//!   [`enter_code_unit`] and inspected innermost-first.
//!
//! Both are per-thread and scoped by RAII guards, so a guard dropped on an
//! early return or a panic unwind restores the previous state. Each guard
//! removes exactly the entry it pushed, even when guards drop out of order.

use crate::tenant::{CodeUnitId, TenantId};
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

thread_local! {
    static FRAMES: RefCell<Vec<(u64, CodeUnitId)>> = const { RefCell::new(Vec::new()) };
    static TENANT_SCOPES: RefCell<Vec<(u64, TenantId)>> = const { RefCell::new(Vec::new()) };
    static NEXT_TOKEN: Cell<u64> = const { Cell::new(0) };
}

fn next_token() -> u64 {
    NEXT_TOKEN.with(|next| {
        let token = next.get();
        next.set(token.wrapping_add(1));
        token
    })
}

fn remove_entry<T>(stack: &RefCell<Vec<(u64, T)>>, token: u64) {
    let mut stack = stack.borrow_mut();
    if let Some(index) = stack.iter().rposition(|(entry, _)| *entry == token) {
        stack.remove(index);
    }
}

/// Ordered frame identities, innermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallChain {
    frames: Vec<CodeUnitId>,
}

impl CallChain {
    /// Build a chain from frames listed innermost first
    pub fn new<I, U>(frames: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<CodeUnitId>,
    {
        Self {
            frames: frames.into_iter().map(Into::into).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot the current thread's frames
    pub fn capture() -> Self {
        FRAMES.with(|frames| Self {
            frames: frames
                .borrow()
                .iter()
                .rev()
                .map(|(_, unit)| unit.clone())
                .collect(),
        })
    }

    pub fn frames(&self) -> &[CodeUnitId] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Everything known about who is asking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    pub tenant: Option<TenantId>,
    pub chain: CallChain,
}

impl CallerContext {
    /// Capture the current thread's tenant scope and frames
    pub fn current() -> Self {
        Self {
            tenant: TENANT_SCOPES
                .with(|scopes| scopes.borrow().last().map(|(_, tenant)| *tenant)),
            chain: CallChain::capture(),
        }
    }

    pub fn for_tenant(tenant: TenantId) -> Self {
        Self {
            tenant: Some(tenant),
            chain: CallChain::empty(),
        }
    }

    pub fn from_chain(chain: CallChain) -> Self {
        Self {
            tenant: None,
            chain,
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant: TenantId) -> Self {
        self.tenant = Some(tenant);
        self
    }
}

/// Removes the frame pushed by [`enter_code_unit`] when dropped
#[must_use = "the frame is popped as soon as the guard is dropped"]
#[derive(Debug)]
pub struct FrameGuard {
    token: u64,
    _not_send: PhantomData<*const ()>,
}

/// Push `unit` as the innermost frame of the current thread's call chain
pub fn enter_code_unit(unit: impl Into<CodeUnitId>) -> FrameGuard {
    let unit = unit.into();
    let token = next_token();
    FRAMES.with(|frames| frames.borrow_mut().push((token, unit)));
    FrameGuard {
        token,
        _not_send: PhantomData,
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| remove_entry(frames, self.token));
    }
}

/// Restores the enclosing tenant scope when dropped
#[must_use = "the tenant scope ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TenantScopeGuard {
    token: u64,
    _not_send: PhantomData<*const ()>,
}

/// Act as `tenant` for resolutions on this thread until the guard drops
pub fn enter_tenant_scope(tenant: TenantId) -> TenantScopeGuard {
    let token = next_token();
    TENANT_SCOPES.with(|scopes| scopes.borrow_mut().push((token, tenant)));
    TenantScopeGuard {
        token,
        _not_send: PhantomData,
    }
}

impl Drop for TenantScopeGuard {
    fn drop(&mut self) {
        TENANT_SCOPES.with(|scopes| remove_entry(scopes, self.token));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_is_innermost_first() {
        let _outer = enter_code_unit("app.main");
        let _middle = enter_code_unit("alpha.service");
        let _inner = enter_code_unit("host.net");

        let chain = CallChain::capture();
        let frames: Vec<&str> = chain.frames().iter().map(CodeUnitId::as_str).collect();
        assert_eq!(frames, vec!["host.net", "alpha.service", "app.main"]);
    }

    #[test]
    fn test_frames_pop_on_drop() {
        {
            let _guard = enter_code_unit("scoped");
            assert_eq!(CallChain::capture().len(), 1);
        }
        assert!(CallChain::capture().is_empty());
    }

    #[test]
    fn test_tenant_scopes_nest() {
        let outer = TenantId::new();
        let inner = TenantId::new();

        assert_eq!(CallerContext::current().tenant, None);
        let _outer_guard = enter_tenant_scope(outer);
        {
            let _inner_guard = enter_tenant_scope(inner);
            assert_eq!(CallerContext::current().tenant, Some(inner));
        }
        assert_eq!(CallerContext::current().tenant, Some(outer));
    }

    #[test]
    fn test_out_of_order_drop_removes_own_frame() {
        let outer = enter_code_unit("beta.core");
        let _inner = enter_code_unit("alpha.core");
        drop(outer);

        let chain = CallChain::capture();
        let frames: Vec<&str> = chain.frames().iter().map(CodeUnitId::as_str).collect();
        assert_eq!(frames, vec!["alpha.core"]);
    }

    #[test]
    fn test_out_of_order_drop_keeps_inner_tenant_scope() {
        let outer_tenant = TenantId::new();
        let inner_tenant = TenantId::new();

        let outer = enter_tenant_scope(outer_tenant);
        let inner = enter_tenant_scope(inner_tenant);
        drop(outer);
        assert_eq!(CallerContext::current().tenant, Some(inner_tenant));

        drop(inner);
        assert_eq!(CallerContext::current().tenant, None);
    }

    #[test]
    fn test_frames_are_per_thread() {
        let _guard = enter_code_unit("main.thread");
        let other = std::thread::spawn(CallChain::capture).join().unwrap();
        assert!(other.is_empty());
        assert_eq!(CallChain::capture().len(), 1);
    }
}
