//! # pharmaguard-rag
//!
//! Maps a patient's pharmacogenomic profile and prescribed drugs to
//! structured dosing recommendations grounded in CPIC guideline documents.
//!
//! ## Architecture
//!
//! ```text
//!   guideline PDFs (one per gene)            patient JSON / VCF upload
//!            │                                          │
//!            ▼                                          ▼
//!   ┌──────────────────┐                    ┌──────────────────────┐
//!   │ pharmaguard-     │                    │  API (axum)          │
//!   │ ingest           │                    │  /analyze            │
//!   │  page text       │                    │  /batch_analyze      │
//!   │  overlap chunks  │                    │  /full_analyze ──────┼──► analysis backend
//!   │  keyword filters │                    └──────────┬───────────┘
//!   └────────┬─────────┘                               │ per drug, in order
//!            │ embeddings                              ▼
//!            ▼                              ┌──────────────────────┐
//!   ┌──────────────────┐  gene+drug filter  │ Enrichment pipeline  │
//!   │  Vector store    │◄───────────────────┤  drug → gene         │
//!   │  (JSON on disk)  │      top-k         │  gene → phenotype    │
//!   └──────────────────┘───────────────────►│  retrieve, generate  │
//!                                           └──────────┬───────────┘
//!                                                      ▼
//!                                           ┌──────────────────────┐
//!                                           │ LLM → parse-or-      │
//!                                           │ default JSON schema  │
//!                                           └──────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`guidelines`] - Versioned gene set, drug→gene table and filter keywords
//! - [`config`] - Environment-based configuration
//! - [`models`] - Chunks, recommendations, request/response types
//! - [`chunking`] - Recursive character splitter with overlap
//! - [`ingest`] - PDF discovery, extraction, filtering and storage
//! - [`search`] - Vector store and gene/drug-scoped retrieval
//! - [`llm`] - Embedding and chat clients, recommendation generator
//! - [`pipeline`] - Patient payload enrichment
//! - [`backend`] - External VCF analysis client
//! - [`api`] - Axum handlers
//! - [`state`] - Services shared across requests

pub mod api;
pub mod backend;
pub mod chunking;
pub mod config;
pub mod guidelines;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod state;
