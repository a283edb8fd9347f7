use promcfg_common::Error;
use promcfg_promql::QueryRestrictor;

use super::model::Rule;

// restricts the expression to the tenant's series and pins the tenant
// label on the rule itself; securing an already-secured rule is a no-op
pub fn secure_rule(
    restrict_queries: bool,
    label: &str,
    tenant_id: &str,
    rule: &mut Rule,
) -> Result<(), Error> {
    if label.is_empty() {
        return Ok(());
    }
    if restrict_queries {
        rule.expr = QueryRestrictor::new()
            .add_matcher(label, tenant_id)
            .restrict(&rule.expr)
            .map_err(|e| Error::Parse(format!("error parsing query: {e}")))?;
    }
    rule.labels.insert(label.to_string(), tenant_id.to_string());
    Ok(())
}
