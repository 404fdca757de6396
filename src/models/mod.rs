// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - admin : Comptes administrateurs (login par email)
//   - users : Utilisateurs créés par un admin (login par user_name)
//   - exchange : Places de marché (BSE, NSE, FUTURES, ...)
//   - stock : Titres d'une place de marché (symbole unique par exchange)
//   - user_stock : Liste personnelle de titres d'un utilisateur
//   - dto : Data Transfer Objects pour les réponses API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les hash de mots de passe ne sont jamais sérialisés en JSON
//   - Les suppressions cascadent : exchange → stocks, user → user_stocks
//
// ============================================================================

pub mod health;
pub mod admin;
pub mod users;
pub mod exchange;
pub mod stock;
pub mod user_stock;
pub mod dto;
