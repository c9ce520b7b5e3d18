//! Role Value Object
//!
//! Storefront roles and the role-satisfaction rules used by access
//! control. The rules are an explicit table, not a numeric comparison:
//! staff satisfies a requirement for staff or customer areas, but a
//! customer never satisfies anything beyond the customer area.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum Role {
    #[default]
    Customer = 0,
    Staff = 1,
    Admin = 2,
}

impl Role {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use Role::*;
        match self {
            Customer => "customer",
            Staff => "staff",
            Admin => "admin",
        }
    }

    /// Whether this role satisfies a required role set.
    ///
    /// - admin satisfies any requirement
    /// - staff satisfies requirements naming staff or customer
    /// - customer satisfies only requirements naming customer
    pub fn satisfies(&self, required: &[Role]) -> bool {
        use Role::*;
        match self {
            Admin => true,
            Staff => required.contains(&Staff) || required.contains(&Customer),
            Customer => required.contains(&Customer),
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Self {
        use Role::*;
        match id {
            0 => Customer,
            1 => Staff,
            2 => Admin,
            _ => {
                tracing::error!("Invalid Role id: {}", id);
                unreachable!("Invalid Role id: {}", id)
            }
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use Role::*;
        match code {
            "customer" => Some(Customer),
            "staff" => Some(Staff),
            "admin" => Some(Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Role::*;

    #[test]
    fn test_role_from_id() {
        assert_eq!(Role::from_id(0), Customer);
        assert_eq!(Role::from_id(1), Staff);
        assert_eq!(Role::from_id(2), Admin);
    }

    #[test]
    fn test_role_from_code() {
        assert_eq!(Role::from_code("customer"), Some(Customer));
        assert_eq!(Role::from_code("staff"), Some(Staff));
        assert_eq!(Role::from_code("admin"), Some(Admin));
        assert_eq!(Role::from_code("superuser"), None);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Customer.to_string(), "customer");
        assert_eq!(Staff.to_string(), "staff");
        assert_eq!(Admin.to_string(), "admin");
    }

    #[test]
    fn test_admin_satisfies_everything() {
        assert!(Admin.satisfies(&[Admin]));
        assert!(Admin.satisfies(&[Staff]));
        assert!(Admin.satisfies(&[Customer]));
        assert!(Admin.satisfies(&[Staff, Customer]));
        assert!(Admin.satisfies(&[]));
    }

    #[test]
    fn test_staff_satisfies_staff_and_customer_areas() {
        assert!(Staff.satisfies(&[Staff]));
        assert!(Staff.satisfies(&[Customer]));
        assert!(Staff.satisfies(&[Staff, Customer]));
        assert!(Staff.satisfies(&[Admin, Customer]));
        assert!(!Staff.satisfies(&[Admin]));
        assert!(!Staff.satisfies(&[]));
    }

    #[test]
    fn test_customer_satisfies_only_customer_area() {
        assert!(Customer.satisfies(&[Customer]));
        assert!(Customer.satisfies(&[Admin, Customer]));
        assert!(!Customer.satisfies(&[Staff]));
        assert!(!Customer.satisfies(&[Admin]));
        assert!(!Customer.satisfies(&[Admin, Staff]));
        assert!(!Customer.satisfies(&[]));
    }
}
