use rdk_portfolio::Ledger;

/// End-of-task performance versus buy-and-hold. Written exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub task_id: String,
    /// Strategy return in percent.
    pub roi_bot: f64,
    /// Buy-and-hold return in percent.
    pub roi_benchmark: f64,
    /// `roi_bot - roi_benchmark`.
    pub diff: f64,
    /// Cash plus shares marked at the last price.
    pub final_wealth: f64,
}

impl Summary {
    pub fn compute(task_id: &str, first_price: f64, last_price: f64, ledger: &Ledger) -> Self {
        let initial = ledger.initial_cash();
        let final_wealth = ledger.wealth(last_price);
        let roi_bot = (final_wealth - initial) / initial * 100.0;
        let roi_benchmark = (last_price - first_price) / first_price * 100.0;
        Self {
            task_id: task_id.to_string(),
            roi_bot,
            roi_benchmark,
            diff: roi_bot - roi_benchmark,
            final_wealth,
        }
    }

    /// Output columns with `precision` fixed decimals.
    pub fn fields(&self, precision: usize) -> [String; 4] {
        [
            self.task_id.clone(),
            format!("{:.*}", precision, self.roi_bot),
            format!("{:.*}", precision, self.roi_benchmark),
            format!("{:.*}", precision, self.diff),
        ]
    }
}
