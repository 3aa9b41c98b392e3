/// SORT tracker with age-adaptive gating and optimal (Kuhn-Munkres) assignment
///
pub mod sort;
