use super::types::*;
use crate::context::{ContextSnapshot, PacingTrend, Severity};

// Mean step between consecutive tension points that counts as movement.
const TENSION_SLOPE_EPSILON: f32 = 0.05;
// Flat tension below this reads as a stall rather than a plateau.
const STALL_TENSION_CEILING: f32 = 0.3;
const MIN_CURVE_POINTS: usize = 3;

pub struct InsightExtractor;

impl InsightExtractor {
    pub fn new() -> Self {
        Self
    }

    /// INTERPRET step. Pure and total: a snapshot where every feed is
    /// absent yields `Insights::neutral()` apart from fields derived from
    /// the trigger itself.
    pub fn extract(&self, snapshot: &ContextSnapshot) -> Insights {
        let pacing = self.assess_pacing(snapshot);
        let character_health = self.assess_character_health(snapshot);
        let continuity_status = self.assess_continuity(snapshot);

        let mut insights = Insights {
            pacing,
            arc_completion: self.estimate_arc_completion(snapshot),
            thematic_consistency: self.score_thematic_consistency(snapshot),
            stage: snapshot
                .progress
                .completion_ratio
                .known()
                .map(|c| NarrativeStage::from_completion(*c))
                .unwrap_or(NarrativeStage::Unknown),
            focus_areas: self.focus_areas(snapshot, pacing),
            character_health,
            continuity_status,
            writer_engagement: self.assess_engagement(snapshot),
            context_quality: self.assess_context_quality(snapshot),
            key_insights: Vec::new(),
        };
        insights.key_insights = self.key_insights(snapshot, &insights);
        insights
    }

    /// Upstream pacing label wins; otherwise read the tension curve.
    fn assess_pacing(&self, snapshot: &ContextSnapshot) -> PacingInsight {
        if let Some(p) = snapshot.language.pacing.known() {
            return match p.trend {
                PacingTrend::Accelerating => PacingInsight::Accelerating,
                PacingTrend::Steady => PacingInsight::Steady,
                PacingTrend::Decelerating => PacingInsight::Decelerating,
                PacingTrend::Stalling => PacingInsight::Stalling,
            };
        }

        let curve = &snapshot.language.tension_curve;
        if curve.len() < MIN_CURVE_POINTS {
            return PacingInsight::Unknown;
        }
        let steps = curve.windows(2).map(|w| w[1] - w[0]).sum::<f32>();
        let slope = steps / (curve.len() - 1) as f32;
        let mean = curve.iter().sum::<f32>() / curve.len() as f32;

        if slope > TENSION_SLOPE_EPSILON {
            PacingInsight::Accelerating
        } else if slope < -TENSION_SLOPE_EPSILON {
            PacingInsight::Decelerating
        } else if mean < STALL_TENSION_CEILING {
            PacingInsight::Stalling
        } else {
            PacingInsight::Steady
        }
    }

    /// Blend of manuscript completion and the share of characters still
    /// developing.
    fn estimate_arc_completion(&self, snapshot: &ContextSnapshot) -> f32 {
        let characters = &snapshot.graph.characters;
        let developing = if characters.is_empty() {
            None
        } else {
            let moving = characters.iter().filter(|c| !c.stagnant).count();
            Some(moving as f32 / characters.len() as f32)
        };

        let estimate = match (snapshot.progress.completion_ratio.known(), developing) {
            (Some(c), Some(d)) => 0.7 * c + 0.3 * d,
            (Some(c), None) => *c,
            (None, Some(d)) => d,
            (None, None) => Insights::NEUTRAL_SCORE,
        };
        estimate.clamp(0.0, 1.0)
    }

    fn score_thematic_consistency(&self, snapshot: &ContextSnapshot) -> f32 {
        if !snapshot.sources.graph.is_present() {
            return Insights::NEUTRAL_SCORE;
        }
        let themes = &snapshot.graph.themes;
        if themes.is_empty() {
            return 0.0;
        }
        let total = themes.len() as f32;
        let utilized = themes.iter().filter(|t| !t.underutilized).count() as f32 / total;
        let manifested = themes.iter().filter(|t| t.manifestations > 0).count() as f32 / total;
        (0.8 * utilized + 0.2 * manifested).clamp(0.0, 1.0)
    }

    fn focus_areas(&self, snapshot: &ContextSnapshot, pacing: PacingInsight) -> Vec<FocusArea> {
        let graph = &snapshot.graph;
        let graph_known = snapshot.sources.graph.is_present();
        let mut focus = Vec::new();

        if pacing == PacingInsight::Stalling {
            focus.push(FocusArea::Pacing);
        }
        if graph.stagnant_characters().next().is_some() {
            focus.push(FocusArea::CharacterDevelopment);
        }
        if snapshot.continuity.flags.len() > 5 || snapshot.continuity.count_at(Severity::Critical) > 0 {
            focus.push(FocusArea::Continuity);
        }
        if graph_known && graph.themes.len() < 2 {
            focus.push(FocusArea::ThematicDevelopment);
        }
        if graph.unresolved_threads.len() > 10 {
            focus.push(FocusArea::PlotManagement);
        }
        if graph_known && !graph.relationships.is_empty() && !graph.relationships.iter().any(|r| r.recently_changed) {
            focus.push(FocusArea::RelationshipDynamics);
        }
        focus
    }

    fn assess_character_health(&self, snapshot: &ContextSnapshot) -> CharacterHealth {
        let characters = &snapshot.graph.characters;
        if characters.is_empty() {
            return CharacterHealth::NoData;
        }
        let stagnant = snapshot.graph.stagnant_characters().count() as f32 / characters.len() as f32;
        if stagnant > 0.5 {
            CharacterHealth::Concerning
        } else if stagnant > 0.3 {
            CharacterHealth::NeedsAttention
        } else {
            CharacterHealth::Healthy
        }
    }

    fn assess_continuity(&self, snapshot: &ContextSnapshot) -> ContinuityStatus {
        if !snapshot.sources.continuity.is_present() {
            return ContinuityStatus::Unknown;
        }
        let c = &snapshot.continuity;
        if c.count_at(Severity::Critical) > 0 {
            ContinuityStatus::CriticalIssues
        } else if c.count_at(Severity::Major) > 0 {
            ContinuityStatus::MajorIssues
        } else if !c.flags.is_empty() {
            ContinuityStatus::MinorIssues
        } else {
            ContinuityStatus::Clean
        }
    }

    fn assess_engagement(&self, snapshot: &ContextSnapshot) -> WriterEngagement {
        if !snapshot.sources.preferences.is_present() {
            return WriterEngagement::Unknown;
        }
        let prefs = &snapshot.preferences;
        if prefs.suggestions_received == 0 {
            return WriterEngagement::NewWriter;
        }
        match prefs.acceptance_rate.known() {
            Some(rate) if *rate > 0.7 => WriterEngagement::HighlyEngaged,
            Some(rate) if *rate > 0.4 => WriterEngagement::ModeratelyEngaged,
            Some(_) => WriterEngagement::LowEngagement,
            None => WriterEngagement::Unknown,
        }
    }

    fn assess_context_quality(&self, snapshot: &ContextSnapshot) -> ContextQuality {
        let score = snapshot.completeness;
        if score >= 0.8 {
            ContextQuality::Excellent
        } else if score >= 0.6 {
            ContextQuality::Good
        } else if score >= 0.4 {
            ContextQuality::Moderate
        } else {
            ContextQuality::Limited
        }
    }

    fn key_insights(&self, snapshot: &ContextSnapshot, insights: &Insights) -> Vec<String> {
        let mut out = Vec::new();

        if insights.pacing == PacingInsight::Stalling {
            out.push("Pacing has stalled; story momentum needs attention".to_string());
        }
        let stagnant = snapshot.graph.stagnant_characters().count();
        if stagnant > 0 {
            out.push(format!("{} characters showing no development", stagnant));
        }
        if insights.focus_areas.contains(&FocusArea::ThematicDevelopment) {
            out.push("Limited thematic development; consider reinforcing themes".to_string());
        }
        let critical = snapshot.continuity.count_at(Severity::Critical);
        if critical > 0 {
            out.push(format!("{} critical continuity issues require immediate attention", critical));
        }
        if insights.focus_areas.contains(&FocusArea::PlotManagement) {
            out.push("High number of unresolved plot threads; consider a resolution strategy".to_string());
        }
        if insights.focus_areas.contains(&FocusArea::RelationshipDynamics) {
            out.push("No recent relationship development; characters may feel static".to_string());
        }
        out
    }
}

impl Default for InsightExtractor {
    fn default() -> Self {
        Self::new()
    }
}
