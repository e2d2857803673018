//! Cost calculator: one step estimating employer costs for a salary.

use remoteflows_jsf::{format_money, FieldValues, SchemaDocument};
use serde_json::{json, Map, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use super::context::FlowContext;
use super::wizard::{FlowBag, FlowWizard, ModifyOverrides};
use crate::domain::cost::{CompanyCurrency, CostCalculatorCountry, CostEstimation};
use crate::domain::step_state::FlowStep;
use crate::error::FlowError;

const FLOW: &str = "cost_calculator";

/// Key of the fieldset holding region specific fields
pub const REGION_FIELDS_KEY: &str = "region_fields";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostCalculatorStep {
    Estimate,
}

impl FlowStep for CostCalculatorStep {
    fn name(&self) -> &'static str {
        match self {
            CostCalculatorStep::Estimate => "estimate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CostCalculatorOptions {
    pub include_benefits: bool,
    pub include_cost_breakdowns: bool,
    /// `fixed` or `indefinite`
    pub employment_term: String,
    /// Job title sent with every estimation
    pub title: Option<String>,
    /// Currency code preselected in the form
    pub default_currency: Option<String>,
    pub modify: ModifyOverrides<CostCalculatorStep>,
}

impl Default for CostCalculatorOptions {
    fn default() -> Self {
        Self {
            include_benefits: true,
            include_cost_breakdowns: true,
            employment_term: "fixed".to_string(),
            title: None,
            default_currency: None,
            modify: ModifyOverrides::new(),
        }
    }
}

/// One successful estimation, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationSummary {
    pub id: Uuid,
    pub country: String,
    pub region_slug: String,
    pub currency: String,
    /// Minor units
    pub annual_gross_salary: i64,
    pub formatted_annual_gross_salary: String,
    pub formatted_annual_total: Option<String>,
    pub formatted_monthly_total: Option<String>,
    pub estimation: CostEstimation,
}

pub struct CostCalculatorFlow {
    ctx: FlowContext,
    options: CostCalculatorOptions,
    wizard: FlowWizard<CostCalculatorStep>,
    base_schema: SchemaDocument,
    countries: Vec<CostCalculatorCountry>,
    currencies: Vec<CompanyCurrency>,
    estimations: Vec<EstimationSummary>,
}

impl CostCalculatorFlow {
    /// Fetch countries and currencies and open the estimate form
    #[instrument(skip_all, fields(flow = FLOW))]
    pub async fn load(ctx: FlowContext, options: CostCalculatorOptions) -> Result<Self, FlowError> {
        let countries = ctx.api.list_cost_calculator_countries().await?;
        let currencies = ctx.api.list_company_currencies().await?;

        let base_schema =
            estimation_schema(&countries, &currencies, options.default_currency.as_deref())?;
        let wizard = Self::open_wizard(&options, &base_schema)?;

        Ok(Self {
            ctx,
            options,
            wizard,
            base_schema,
            countries,
            currencies,
            estimations: Vec::new(),
        })
    }

    fn open_wizard(
        options: &CostCalculatorOptions,
        schema: &SchemaDocument,
    ) -> Result<FlowWizard<CostCalculatorStep>, FlowError> {
        let mut wizard = FlowWizard::new(
            FLOW,
            vec![CostCalculatorStep::Estimate],
            options.modify.clone(),
        )?;
        wizard.install_schema(CostCalculatorStep::Estimate, schema.clone())?;
        Ok(wizard)
    }

    pub fn bag(&self) -> FlowBag<CostCalculatorStep> {
        self.wizard.bag()
    }

    pub fn countries(&self) -> &[CostCalculatorCountry] {
        &self.countries
    }

    pub fn set_value(&mut self, name: &str, value: Value) {
        self.wizard.form_mut().set_value(name, value);
    }

    /// Add the extra fields a region asks for, nested under [`REGION_FIELDS_KEY`].
    #[instrument(skip(self), fields(flow = FLOW))]
    pub async fn load_region_fields(&mut self, region_slug: &str) -> Result<(), FlowError> {
        let raw = self.ctx.api.region_fields_schema(region_slug).await?;
        let region = SchemaDocument::from_value(raw)?;

        let schema = if region.is_empty() {
            self.base_schema.clone()
        } else {
            let mut nested = region.into_value();
            if let Some(map) = nested.as_object_mut() {
                map.entry("type".to_string()).or_insert(json!("object"));
                map.entry("title".to_string()).or_insert(json!("Regional details"));
            }
            let wrapper = SchemaDocument::from_value(json!({
                "type": "object",
                "properties": { REGION_FIELDS_KEY: nested }
            }))?;
            SchemaDocument::concat(&[self.base_schema.clone(), wrapper])
        };

        let values = self.wizard.form().values().clone();
        self.wizard.seed(CostCalculatorStep::Estimate, values);
        self.wizard.install_schema(CostCalculatorStep::Estimate, schema)
    }

    /// Validate, request an estimation and record it.
    #[instrument(skip_all, fields(flow = FLOW))]
    pub async fn submit(&mut self, values: FieldValues) -> Result<EstimationSummary, FlowError> {
        let step = self.wizard.current();
        if self.wizard.state().is_completed() {
            let error = FlowError::InvalidStep("estimation already submitted, reset the flow first".to_string());
            return Err(self.ctx.fail(FLOW, step.name(), error));
        }

        let values = self.resolve_selections(values);
        self.wizard.form_mut().set_values(values);
        self.wizard.form_mut().begin_submit();
        let result = self.estimate().await;
        self.wizard.form_mut().finish_submit();

        let committed = result.and_then(|estimated| {
            self.wizard.commit()?;
            Ok(estimated)
        });
        match committed {
            Ok((summary, response)) => {
                info!(
                    region = %summary.region_slug,
                    salary = %summary.formatted_annual_gross_salary,
                    "Estimation created"
                );
                self.estimations.push(summary.clone());
                self.ctx.succeed(FLOW, step.name(), &response);
                Ok(summary)
            }
            Err(error) => Err(self.ctx.fail(FLOW, step.name(), error)),
        }
    }

    async fn estimate(&self) -> Result<(EstimationSummary, Value), FlowError> {
        let payload = self.wizard.form().checked_payload()?;
        let region_slug = payload
            .get("country")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let request = estimation_payload(&payload, &self.options);

        let estimation = self.ctx.api.create_estimation(&request).await?;
        let summary = self.summarize(&region_slug, estimation)?;
        let response = serde_json::to_value(&summary.estimation)?;
        Ok((summary, response))
    }

    fn summarize(&self, region_slug: &str, estimation: CostEstimation) -> Result<EstimationSummary, FlowError> {
        let costs = estimation
            .employments
            .first()
            .map(|e| e.employer_currency_costs.clone())
            .ok_or_else(|| FlowError::Unexpected("estimation without employments".to_string()))?;

        let country = self
            .countries
            .iter()
            .find(|c| c.region_slug == region_slug)
            .map(|c| c.name.clone())
            .or_else(|| {
                estimation
                    .employments
                    .first()
                    .and_then(|e| e.country.as_ref())
                    .and_then(|c| c.name.clone())
            })
            .unwrap_or_else(|| region_slug.to_string());
        let code = costs.currency.code.clone();

        Ok(EstimationSummary {
            id: Uuid::new_v4(),
            country,
            region_slug: region_slug.to_string(),
            formatted_annual_gross_salary: format_money(costs.annual_gross_salary, &code),
            formatted_annual_total: costs.annual_total.map(|v| format_money(v, &code)),
            formatted_monthly_total: costs.monthly_total.map(|v| format_money(v, &code)),
            annual_gross_salary: costs.annual_gross_salary,
            currency: code,
            estimation,
        })
    }

    /// Accept country names/codes and currency codes in place of slugs
    fn resolve_selections(&self, mut values: FieldValues) -> FieldValues {
        if let Some(Value::String(raw)) = values.get("country") {
            if let Some(country) = self.countries.iter().find(|c| {
                c.region_slug == *raw
                    || c.code.eq_ignore_ascii_case(raw)
                    || c.name.eq_ignore_ascii_case(raw)
            }) {
                values.insert("country".to_string(), json!(country.region_slug));
            }
        }
        if let Some(Value::String(raw)) = values.get("currency") {
            if let Some(currency) = self
                .currencies
                .iter()
                .find(|c| c.slug == *raw || c.code.eq_ignore_ascii_case(raw))
            {
                values.insert("currency".to_string(), json!(currency.slug));
            }
        }
        values
    }

    pub fn estimations(&self) -> &[EstimationSummary] {
        &self.estimations
    }

    /// Remove an estimation; false when the id is unknown
    pub fn remove_estimation(&mut self, id: Uuid) -> bool {
        let before = self.estimations.len();
        self.estimations.retain(|e| e.id != id);
        before != self.estimations.len()
    }

    /// Start a new estimate. Recorded estimations are kept.
    pub fn reset(&mut self) -> Result<(), FlowError> {
        self.wizard = Self::open_wizard(&self.options, &self.base_schema)?;
        Ok(())
    }
}

fn estimation_schema(
    countries: &[CostCalculatorCountry],
    currencies: &[CompanyCurrency],
    default_currency: Option<&str>,
) -> Result<SchemaDocument, FlowError> {
    let mut country = json!({ "type": "string", "title": "Country" });
    if !countries.is_empty() {
        country["oneOf"] = countries
            .iter()
            .map(|c| json!({ "const": c.region_slug, "title": c.name }))
            .collect();
    }

    let mut currency = json!({ "type": "string", "title": "Currency" });
    if !currencies.is_empty() {
        currency["oneOf"] = currencies
            .iter()
            .map(|c| json!({ "const": c.slug, "title": c.code }))
            .collect();
    }
    let default = default_currency
        .and_then(|code| currencies.iter().find(|c| c.code.eq_ignore_ascii_case(code)));
    if let Some(default) = default {
        currency["default"] = json!(default.slug);
    }

    let mut presentation = Map::new();
    presentation.insert("inputType".to_string(), json!("money"));
    if let Some(default) = default {
        presentation.insert("currency".to_string(), json!(default.code));
    }

    Ok(SchemaDocument::from_value(json!({
        "type": "object",
        "properties": {
            "country": country,
            "currency": currency,
            "salary": {
                "type": "integer",
                "title": "Annual gross salary",
                "minimum": 1,
                "x-jsf-presentation": presentation
            }
        },
        "required": ["country", "currency", "salary"],
        "x-jsf-order": ["country", "currency", "salary"]
    }))?)
}

fn estimation_payload(payload: &FieldValues, options: &CostCalculatorOptions) -> Value {
    let salary = payload.get("salary").cloned().unwrap_or(Value::Null);

    let mut employment = Map::new();
    employment.insert(
        "region_slug".to_string(),
        payload.get("country").cloned().unwrap_or(Value::Null),
    );
    employment.insert("annual_gross_salary".to_string(), salary.clone());
    employment.insert("annual_gross_salary_in_employer_currency".to_string(), salary);
    employment.insert("employment_term".to_string(), json!(options.employment_term));
    if let Some(title) = &options.title {
        employment.insert("title".to_string(), json!(title));
    }
    if let Some(region_fields) = payload.get(REGION_FIELDS_KEY) {
        employment.insert(REGION_FIELDS_KEY.to_string(), region_fields.clone());
    }

    json!({
        "employer_currency_slug": payload.get("currency").cloned().unwrap_or(Value::Null),
        "include_benefits": options.include_benefits,
        "include_cost_breakdowns": options.include_cost_breakdowns,
        "employments": [Value::Object(employment)]
    })
}
