use crate::StrategyError;
use raffle_shared::constants::{split_list, SPLIT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Phase of the raffle a rule model applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStage {
    /// Evaluated by the pre-draw chain.
    Before,
    /// Evaluated once an award id has been drawn.
    Center,
    /// Evaluated after the draw has been settled.
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleModel {
    #[serde(rename = "rule_blacklist")]
    Blacklist,
    #[serde(rename = "rule_weight")]
    Weight,
    #[serde(rename = "rule_lock")]
    Lock,
    #[serde(rename = "rule_luck_award")]
    LuckAward,
}

impl RuleModel {
    pub const ALL: [RuleModel; 4] = [
        RuleModel::Blacklist,
        RuleModel::Weight,
        RuleModel::Lock,
        RuleModel::LuckAward,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            RuleModel::Blacklist => "rule_blacklist",
            RuleModel::Weight => "rule_weight",
            RuleModel::Lock => "rule_lock",
            RuleModel::LuckAward => "rule_luck_award",
        }
    }

    pub fn stage(&self) -> RuleStage {
        match self {
            RuleModel::Blacklist | RuleModel::Weight => RuleStage::Before,
            RuleModel::Lock => RuleStage::Center,
            RuleModel::LuckAward => RuleStage::After,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|model| model.code().eq_ignore_ascii_case(code))
    }
}

impl FromStr for RuleModel {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| StrategyError::UnknownRuleModel(s.trim().to_string()))
    }
}

impl fmt::Display for RuleModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleLogicCheckType {
    /// Continue with the next node or the normal flow.
    Allow,
    /// Stop and use the rule's own outcome.
    TakeOver,
}

impl RuleLogicCheckType {
    pub fn code(&self) -> &'static str {
        match self {
            RuleLogicCheckType::Allow => "0000",
            RuleLogicCheckType::TakeOver => "0001",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulePayload {
    BlacklistAward(i32),
    WeightTierKey(String),
    LuckAward(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDecision {
    pub outcome: RuleLogicCheckType,
    pub rule_model: Option<RuleModel>,
    pub payload: Option<RulePayload>,
}

impl RuleDecision {
    pub fn allow() -> Self {
        Self {
            outcome: RuleLogicCheckType::Allow,
            rule_model: None,
            payload: None,
        }
    }

    pub fn allow_by(rule_model: RuleModel) -> Self {
        Self {
            rule_model: Some(rule_model),
            ..Self::allow()
        }
    }

    pub fn take_over(rule_model: RuleModel, payload: Option<RulePayload>) -> Self {
        Self {
            outcome: RuleLogicCheckType::TakeOver,
            rule_model: Some(rule_model),
            payload,
        }
    }

    pub fn is_take_over(&self) -> bool {
        self.outcome == RuleLogicCheckType::TakeOver
    }
}

/// Rule models attached to one award of a strategy, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAwardRuleModels {
    pub rule_models: Vec<String>,
}

impl StrategyAwardRuleModels {
    /// Parses the comma separated column value; `None` means no rules.
    pub fn from_raw(raw: Option<&str>) -> Self {
        Self {
            rule_models: raw
                .map(|value| split_list(value, SPLIT).map(String::from).collect())
                .unwrap_or_default(),
        }
    }

    /// Models of `stage`, in declaration order. Codes this core does not
    /// know are ignored; they belong to rule engines outside the raffle.
    pub fn stage_models(&self, stage: RuleStage) -> Vec<RuleModel> {
        self.rule_models
            .iter()
            .filter_map(|code| {
                let model = RuleModel::from_code(code);
                if model.is_none() {
                    debug!(rule_model = %code, ?stage, "unknown award rule model skipped");
                }
                model
            })
            .filter(|model| model.stage() == stage)
            .collect()
    }

    pub fn center_models(&self) -> Vec<RuleModel> {
        self.stage_models(RuleStage::Center)
    }

    pub fn after_models(&self) -> Vec<RuleModel> {
        self.stage_models(RuleStage::After)
    }
}
