//! Per-symbol near-high evaluation with primary/secondary bar sources.

use super::scheduler::{BatchScheduler, TaskOutcome};
use crate::domain::errors::SourceError;
use crate::domain::market::{BarSeries, BarWindow, Symbol};
use crate::domain::ports::BarSource;
use crate::domain::signal::{CandidateSignal, NearHighRule};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolEvaluation {
    Signal(CandidateSignal),
    NoSignal,
    /// Both sources failed for this symbol.
    Failed,
}

/// Aggregate of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub signals: Vec<CandidateSignal>,
    pub evaluated: usize,
    pub failed: usize,
}

pub struct SignalEvaluator {
    primary: Arc<dyn BarSource>,
    secondary: Option<Arc<dyn BarSource>>,
    rule: NearHighRule,
    lookback_days: u32,
    request_timeout: Duration,
}

impl SignalEvaluator {
    pub fn new(
        primary: Arc<dyn BarSource>,
        secondary: Option<Arc<dyn BarSource>>,
        rule: NearHighRule,
        lookback_days: u32,
        request_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            rule,
            lookback_days,
            request_timeout,
        }
    }

    async fn fetch(&self, source: &dyn BarSource, symbol: &Symbol, window: &BarWindow) -> Result<BarSeries, SourceError> {
        match tokio::time::timeout(self.request_timeout, source.get_bars(symbol, window)).await {
            Ok(Ok(series)) if series.is_empty() => Err(SourceError::empty(source.name(), format!("bars for {}", symbol))),
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                source_name: source.name().to_string(),
                timeout_ms: self.request_timeout.as_millis() as u64,
            }),
        }
    }

    /// Primary first; any failure there retries the same window on the secondary.
    pub async fn evaluate_symbol(&self, symbol: &Symbol, window: &BarWindow, now: DateTime<Utc>) -> SymbolEvaluation {
        let series = match self.fetch(self.primary.as_ref(), symbol, window).await {
            Ok(series) => series,
            Err(primary_err) => {
                debug!("SignalEvaluator: {} primary failed: {}", symbol, primary_err);
                let Some(secondary) = &self.secondary else {
                    warn!("SignalEvaluator: {} skipped: {}", symbol, primary_err);
                    return SymbolEvaluation::Failed;
                };
                match self.fetch(secondary.as_ref(), symbol, window).await {
                    Ok(series) => series,
                    Err(secondary_err) => {
                        warn!(
                            "SignalEvaluator: {} skipped, both sources failed ({}; {})",
                            symbol, primary_err, secondary_err
                        );
                        return SymbolEvaluation::Failed;
                    }
                }
            }
        };

        match self.rule.evaluate(&series, now) {
            Some(signal) => SymbolEvaluation::Signal(signal),
            None => SymbolEvaluation::NoSignal,
        }
    }

    pub async fn evaluate_all(&self, symbols: Vec<Symbol>, scheduler: &BatchScheduler) -> EvaluationSummary {
        let now = Utc::now();
        let window = BarWindow::ending_at(self.lookback_days, now);
        let total = symbols.len();

        let outcomes = scheduler
            .run(symbols, |symbol: Symbol| async move {
                self.evaluate_symbol(&symbol, &window, now).await
            })
            .await;

        let mut summary = EvaluationSummary {
            evaluated: total,
            ..EvaluationSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Completed(SymbolEvaluation::Signal(signal)) => summary.signals.push(signal),
                TaskOutcome::Completed(SymbolEvaluation::NoSignal) => {}
                TaskOutcome::Completed(SymbolEvaluation::Failed) | TaskOutcome::Panicked(_) => summary.failed += 1,
            }
        }

        info!(
            "SignalEvaluator: {} evaluated, {} near high, {} failed",
            summary.evaluated,
            summary.signals.len(),
            summary.failed
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Bar;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    /// Serves fixed (high, close) pairs per symbol; anything else is a 404.
    struct ScriptedSource {
        name: &'static str,
        series: HashMap<&'static str, Vec<(i64, i64)>>,
        hang: bool,
    }

    #[async_trait]
    impl BarSource for ScriptedSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn get_bars(&self, symbol: &Symbol, _window: &BarWindow) -> Result<BarSeries, SourceError> {
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            let points = self.series.get(symbol.as_str()).ok_or_else(|| SourceError::Status {
                source_name: self.name.to_string(),
                status: 400,
                body: "Invalid symbol.".to_string(),
            })?;
            let bars = points
                .iter()
                .enumerate()
                .map(|(i, (high, close))| Bar {
                    timestamp: i as i64 * 86_400_000,
                    open: Decimal::from(*close),
                    high: Decimal::from(*high),
                    low: Decimal::from(*close),
                    close: Decimal::from(*close),
                    volume: Decimal::ONE,
                })
                .collect();
            Ok(BarSeries::new(symbol.clone(), bars))
        }
    }

    fn source(name: &'static str, series: &[(&'static str, Vec<(i64, i64)>)]) -> Arc<dyn BarSource> {
        Arc::new(ScriptedSource {
            name,
            series: series.iter().cloned().collect(),
            hang: false,
        })
    }

    fn symbol(raw: &str) -> Symbol {
        Symbol::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_secondary_used_when_primary_fails() {
        let evaluator = SignalEvaluator::new(
            source("primary", &[("BTCUSDT", vec![(100, 95)])]),
            Some(source("secondary", &[("FAKEUSDT", vec![(50, 48)])])),
            NearHighRule::default(),
            365,
            Duration::from_secs(1),
        );
        let window = BarWindow::daily(365);
        let now = Utc::now();

        assert!(matches!(
            evaluator.evaluate_symbol(&symbol("FAKEUSDT"), &window, now).await,
            SymbolEvaluation::Signal(_)
        ));
        assert_eq!(
            evaluator.evaluate_symbol(&symbol("NOPEUSDT"), &window, now).await,
            SymbolEvaluation::Failed
        );
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        let evaluator = SignalEvaluator::new(
            source("primary", &[("ATUSDT", vec![(100, 90)]), ("BELOWUSDT", vec![(100, 89)])]),
            None,
            NearHighRule::default(),
            365,
            Duration::from_secs(1),
        );
        let window = BarWindow::daily(365);
        let now = Utc::now();

        // (100 - 90) / 100 = 0.10 is still near high
        assert!(matches!(
            evaluator.evaluate_symbol(&symbol("ATUSDT"), &window, now).await,
            SymbolEvaluation::Signal(s) if !s.is_ath
        ));
        assert_eq!(
            evaluator.evaluate_symbol(&symbol("BELOWUSDT"), &window, now).await,
            SymbolEvaluation::NoSignal
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_primary_times_out_to_secondary() {
        let evaluator = SignalEvaluator::new(
            Arc::new(ScriptedSource {
                name: "primary",
                series: HashMap::new(),
                hang: true,
            }),
            Some(source("secondary", &[("ETHUSDT", vec![(10, 10)])])),
            NearHighRule::default(),
            365,
            Duration::from_secs(10),
        );

        let result = evaluator
            .evaluate_symbol(&symbol("ETHUSDT"), &BarWindow::daily(365), Utc::now())
            .await;
        assert!(matches!(result, SymbolEvaluation::Signal(_)));
    }

    #[tokio::test]
    async fn test_evaluate_all_counts_failures() {
        let evaluator = SignalEvaluator::new(
            source("primary", &[("BTCUSDT", vec![(100, 99)]), ("ETHUSDT", vec![(100, 50)])]),
            None,
            NearHighRule::default(),
            365,
            Duration::from_secs(1),
        );
        let scheduler = BatchScheduler::new(2, Duration::ZERO);

        let summary = evaluator
            .evaluate_all(vec![symbol("BTCUSDT"), symbol("ETHUSDT"), symbol("GONEUSDT")], &scheduler)
            .await;

        assert_eq!(summary.evaluated, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.signals.len(), 1);
        assert_eq!(summary.signals[0].symbol.as_str(), "BTCUSDT");
    }
}
