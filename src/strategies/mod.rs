pub mod crossover;
pub mod volatility;
