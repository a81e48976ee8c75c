//! Pure risk aggregation over detected clauses. No I/O; the thresholds
//! here drive contract-level risk everywhere else in the system.

use covenant_core::{clause::ClauseType, contract::RiskLevel};
use serde::Serialize;

use crate::analyzer::DetectedClause;

/// Contract-level risk derived from clause-level assessments.
#[derive(Debug, Clone, Serialize)]
pub struct RiskSummary {
  pub overall:             RiskLevel,
  pub risk_factors:        Vec<String>,
  pub recommendations:     Vec<String>,
  pub high_risk_clauses:   usize,
  pub medium_risk_clauses: usize,
}

/// Aggregate clause assessments into an overall risk level.
///
/// High when at least 3 high-risk clauses; medium when at least 1 high or
/// at least 5 medium; low otherwise. An empty clause list reads as medium
/// with no factors.
pub fn aggregate_risk(clauses: &[DetectedClause]) -> RiskSummary {
  if clauses.is_empty() {
    return RiskSummary {
      overall:             RiskLevel::Medium,
      risk_factors:        vec![],
      recommendations:     vec![],
      high_risk_clauses:   0,
      medium_risk_clauses: 0,
    };
  }

  let high = clauses
    .iter()
    .filter(|c| c.risk_assessment == RiskLevel::High)
    .count();
  let medium = clauses
    .iter()
    .filter(|c| c.risk_assessment == RiskLevel::Medium)
    .count();

  let overall = if high >= 3 {
    RiskLevel::High
  } else if high >= 1 || medium >= 5 {
    RiskLevel::Medium
  } else {
    RiskLevel::Low
  };

  let has_penalty =
    clauses.iter().any(|c| c.clause_type == ClauseType::Penalty);
  let has_regulatory =
    clauses.iter().any(|c| c.clause_type == ClauseType::Regulatory);
  let has_renewal =
    clauses.iter().any(|c| c.clause_type == ClauseType::Renewal);
  let needs_action = clauses.iter().any(|c| c.action_required);

  let mut risk_factors = Vec::new();
  if has_penalty {
    risk_factors.push("Contains penalty clauses".to_owned());
  }
  if has_regulatory {
    risk_factors.push("Subject to regulatory compliance".to_owned());
  }
  if needs_action {
    risk_factors
      .push("Immediate action required for some clauses".to_owned());
  }

  let mut recommendations = Vec::new();
  if overall != RiskLevel::Low {
    recommendations.push("Schedule detailed compliance review".to_owned());
  }
  if has_regulatory {
    recommendations
      .push("Ensure all regulatory requirements are met".to_owned());
  }
  if has_renewal {
    recommendations.push("Set up renewal reminders".to_owned());
  }

  RiskSummary {
    overall,
    risk_factors,
    recommendations,
    high_risk_clauses: high,
    medium_risk_clauses: medium,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn clause(risk: RiskLevel) -> DetectedClause {
    DetectedClause { risk_assessment: risk, ..Default::default() }
  }

  #[test]
  fn three_high_clauses_read_high() {
    let clauses =
      vec![clause(RiskLevel::High), clause(RiskLevel::High), clause(RiskLevel::High)];
    assert_eq!(aggregate_risk(&clauses).overall, RiskLevel::High);
  }

  #[test]
  fn one_high_reads_medium() {
    let clauses = vec![
      clause(RiskLevel::High),
      clause(RiskLevel::Medium),
      clause(RiskLevel::Medium),
    ];
    let summary = aggregate_risk(&clauses);
    assert_eq!(summary.overall, RiskLevel::Medium);
    assert_eq!(summary.high_risk_clauses, 1);
    assert_eq!(summary.medium_risk_clauses, 2);
  }

  #[test]
  fn five_medium_read_medium() {
    let clauses = vec![clause(RiskLevel::Medium); 5];
    assert_eq!(aggregate_risk(&clauses).overall, RiskLevel::Medium);
  }

  #[test]
  fn four_medium_read_low() {
    let clauses = vec![clause(RiskLevel::Medium); 4];
    assert_eq!(aggregate_risk(&clauses).overall, RiskLevel::Low);
  }

  #[test]
  fn low_clauses_read_low() {
    let clauses = vec![clause(RiskLevel::Low), clause(RiskLevel::Low)];
    let summary = aggregate_risk(&clauses);
    assert_eq!(summary.overall, RiskLevel::Low);
    assert!(summary.risk_factors.is_empty());
    assert!(summary.recommendations.is_empty());
  }

  #[test]
  fn empty_clause_list_reads_medium_without_factors() {
    let summary = aggregate_risk(&[]);
    assert_eq!(summary.overall, RiskLevel::Medium);
    assert!(summary.risk_factors.is_empty());
    assert!(summary.recommendations.is_empty());
  }

  #[test]
  fn factors_and_recommendations_follow_clause_types() {
    let mut penalty = clause(RiskLevel::High);
    penalty.clause_type = ClauseType::Penalty;
    let mut regulatory = clause(RiskLevel::Medium);
    regulatory.clause_type = ClauseType::Regulatory;
    regulatory.action_required = true;
    let mut renewal = clause(RiskLevel::Low);
    renewal.clause_type = ClauseType::Renewal;

    let summary = aggregate_risk(&[penalty, regulatory, renewal]);
    assert_eq!(summary.risk_factors, vec![
      "Contains penalty clauses",
      "Subject to regulatory compliance",
      "Immediate action required for some clauses",
    ]);
    assert_eq!(summary.recommendations, vec![
      "Schedule detailed compliance review",
      "Ensure all regulatory requirements are met",
      "Set up renewal reminders",
    ]);
  }
}
