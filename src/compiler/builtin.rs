//! Built-in section markup per tier
//!
//! Sections that carry no markup of their own fall back to these bodies.
//! Enterprise markup is a superset of the professional set.

use crate::template::{SectionType, Tier};

const EXECUTIVE_SUMMARY: &str = r#"<section class="executive-summary">
  <h2>{{metadata.title}}</h2>
  <p>Prepared for {{business_data.company_name}} on {{formatDate metadata.report_date "MMMM D, YYYY"}}.</p>
  {{#if business_data.valuation.estimated_value}}
  <p class="headline">Estimated value: <strong>{{formatCurrency business_data.valuation.estimated_value}}</strong></p>
  {{/if}}
  {{#if business_data.summary}}<p>{{business_data.summary}}</p>{{/if}}
</section>"#;

const COMPANY_OVERVIEW: &str = r#"<section class="company-overview">
  <h2>{{business_data.company_name}}</h2>
  <dl>
    <dt>Industry</dt><dd>{{business_data.industry}}</dd>
    <dt>Founded</dt><dd>{{business_data.founded_year}}</dd>
    <dt>Employees</dt><dd>{{formatNumber business_data.employee_count}}</dd>
  </dl>
  {{#if business_data.description}}<p>{{business_data.description}}</p>{{/if}}
</section>"#;

const FINANCIAL_ANALYSIS: &str = r#"<section class="financial-analysis">
  <table>
    <tr><th>Revenue</th><td>{{formatCurrency business_data.financials.revenue}}</td></tr>
    <tr><th>EBITDA</th><td>{{formatCurrency business_data.financials.ebitda}}</td></tr>
    <tr><th>Net income</th><td>{{formatCurrency business_data.financials.net_income}}</td></tr>
    <tr><th>Gross margin</th><td>{{formatPercentage business_data.financials.gross_margin}}</td></tr>
  </table>
  {{#each business_data.financials.history}}
  <p>{{this.year}}: {{formatCurrency this.revenue}}</p>
  {{/each}}
</section>"#;

const VALUATION_SUMMARY: &str = r#"<section class="valuation-summary">
  <p>Estimated value: <strong>{{formatCurrency business_data.valuation.estimated_value}}</strong></p>
  <p>Range: {{formatCurrency business_data.valuation.low}} to {{formatCurrency business_data.valuation.high}}</p>
  {{#if business_data.valuation.confidence}}
  <p>Confidence: {{formatPercentage business_data.valuation.confidence}}</p>
  {{/if}}
</section>"#;

const VALUATION_METHODS: &str = r#"<section class="valuation-methods">
  {{#each business_data.valuation.methods}}
  <div class="method">
    <h3>{{this.name}}</h3>
    <p>{{formatCurrency this.value}} (weight {{formatPercentage this.weight}})</p>
  </div>
  {{else}}
  <p>No valuation methods were applied.</p>
  {{/each}}
</section>"#;

const MARKET_ANALYSIS: &str = r#"<section class="market-analysis">
  <p>Market size: {{formatCurrency business_data.market.size}}</p>
  <p>Growth rate: {{formatPercentage business_data.market.growth_rate}}</p>
  {{#each business_data.market.competitors}}<p>{{this}}</p>{{/each}}
</section>"#;

const RISK_ASSESSMENT: &str = r#"<section class="risk-assessment">
  <ul>
  {{#each business_data.risks}}
    <li class="risk-{{lowercase this.level}}"><strong>{{capitalize this.level}}</strong>: {{this.description}}</li>
  {{else}}
    <li>No material risks identified.</li>
  {{/each}}
  </ul>
</section>"#;

const RECOMMENDATIONS: &str = r#"<section class="recommendations">
  <ol>
  {{#each business_data.recommendations}}<li>{{this}}</li>{{/each}}
  </ol>
</section>"#;

const APPENDIX: &str = r#"<section class="appendix">
  <p>Report generated for {{metadata.prepared_for}} by {{metadata.prepared_by}}.</p>
  {{#if metadata.disclaimer}}<p class="disclaimer">{{metadata.disclaimer}}</p>{{/if}}
</section>"#;

const INDUSTRY_BENCHMARKS: &str = r#"<section class="industry-benchmarks">
  <table>
  {{#each enterprise_data.benchmarks}}
    <tr><th>{{this.metric}}</th><td>{{formatNumber this.company 2}}</td><td>{{formatNumber this.industry_median 2}}</td></tr>
  {{/each}}
  </table>
</section>"#;

const SCENARIO_ANALYSIS: &str = r#"<section class="scenario-analysis">
  {{#each enterprise_data.scenarios}}
  <div class="scenario">
    <h3>{{capitalize this.name}}</h3>
    <p>Value: {{formatCurrency this.value}}, probability {{formatPercentage this.probability}}</p>
  </div>
  {{/each}}
</section>"#;

const ENTERPRISE_EXECUTIVE_SUMMARY: &str = r#"<section class="executive-summary enterprise">
  <h2>{{metadata.title}}</h2>
  <p>Prepared for {{business_data.company_name}} on {{formatDate metadata.report_date "MMMM D, YYYY"}}.</p>
  <p class="headline">Estimated value: <strong>{{formatCurrency business_data.valuation.estimated_value}}</strong></p>
  {{#if enterprise_data.strategic_summary}}<p>{{enterprise_data.strategic_summary}}</p>{{/if}}
  {{#if enterprise_data.scenarios}}<p>Scenario modelling included.</p>{{/if}}
</section>"#;

/// Built-in markup for a section type, if the tier has one
pub fn builtin_markup(tier: Tier, section_type: SectionType) -> Option<&'static str> {
    match (tier, section_type) {
        (_, SectionType::Custom) => None,
        (Tier::Enterprise, SectionType::ExecutiveSummary) => Some(ENTERPRISE_EXECUTIVE_SUMMARY),
        (Tier::Enterprise, SectionType::IndustryBenchmarks) => Some(INDUSTRY_BENCHMARKS),
        (Tier::Enterprise, SectionType::ScenarioAnalysis) => Some(SCENARIO_ANALYSIS),
        (Tier::Professional, SectionType::IndustryBenchmarks | SectionType::ScenarioAnalysis) => None,
        (_, SectionType::ExecutiveSummary) => Some(EXECUTIVE_SUMMARY),
        (_, SectionType::CompanyOverview) => Some(COMPANY_OVERVIEW),
        (_, SectionType::FinancialAnalysis) => Some(FINANCIAL_ANALYSIS),
        (_, SectionType::ValuationSummary) => Some(VALUATION_SUMMARY),
        (_, SectionType::ValuationMethods) => Some(VALUATION_METHODS),
        (_, SectionType::MarketAnalysis) => Some(MARKET_ANALYSIS),
        (_, SectionType::RiskAssessment) => Some(RISK_ASSESSMENT),
        (_, SectionType::Recommendations) => Some(RECOMMENDATIONS),
        (_, SectionType::Appendix) => Some(APPENDIX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_has_no_builtin() {
        assert!(builtin_markup(Tier::Professional, SectionType::Custom).is_none());
        assert!(builtin_markup(Tier::Enterprise, SectionType::Custom).is_none());
    }

    #[test]
    fn test_enterprise_only_sections() {
        assert!(builtin_markup(Tier::Professional, SectionType::ScenarioAnalysis).is_none());
        assert!(builtin_markup(Tier::Professional, SectionType::IndustryBenchmarks).is_none());
        assert!(builtin_markup(Tier::Enterprise, SectionType::ScenarioAnalysis).is_some());
        assert!(builtin_markup(Tier::Enterprise, SectionType::IndustryBenchmarks).is_some());
    }

    #[test]
    fn test_tier_specific_summary() {
        let pro = builtin_markup(Tier::Professional, SectionType::ExecutiveSummary).unwrap();
        let ent = builtin_markup(Tier::Enterprise, SectionType::ExecutiveSummary).unwrap();
        assert_ne!(pro, ent);
        assert!(ent.contains("enterprise_data"));
    }
}
